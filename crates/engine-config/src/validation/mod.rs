pub mod catalog_validator;
