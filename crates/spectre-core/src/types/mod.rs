pub mod beacon;
pub mod message;
pub mod witness;
