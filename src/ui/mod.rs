pub mod dom;

pub use dom::DomNode;
