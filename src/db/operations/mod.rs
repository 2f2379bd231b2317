pub mod study_items;
