mod gateway_tests;
mod health_tests;
