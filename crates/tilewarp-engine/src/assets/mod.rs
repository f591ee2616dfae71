pub mod stage;
