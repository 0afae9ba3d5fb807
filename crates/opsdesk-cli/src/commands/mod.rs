pub mod listen;
pub mod route;
