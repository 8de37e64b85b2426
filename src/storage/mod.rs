pub use root::Root;

mod root;
