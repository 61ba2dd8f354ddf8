pub mod foxess;
