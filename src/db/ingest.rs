/// Insert one validated structure with its calculator
pub mod system;
