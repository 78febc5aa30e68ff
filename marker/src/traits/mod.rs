pub mod confidence;
