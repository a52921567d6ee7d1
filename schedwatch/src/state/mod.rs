pub mod store;

pub use store::InstanceStore;
