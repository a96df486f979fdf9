pub mod extraction_store;
