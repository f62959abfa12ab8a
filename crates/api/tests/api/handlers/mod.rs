mod availability_test;
mod booking_test;
mod config_test;
mod middleware_test;
mod provider_test;
