
mod collection_tests;
mod health_tests;
mod playout_tests;
mod schedule_tests;
