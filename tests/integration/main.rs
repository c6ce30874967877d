//! Integration tests against a mock library backend

mod dashboard_tests;
