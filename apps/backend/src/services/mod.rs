pub mod study_timer;
