mod controller;

pub use controller::ExhibitController;
