pub mod canon;
pub mod crypto;
pub mod didcore;
pub mod jwk;
pub mod ldmodel;
pub mod methods;
pub mod proof;
pub mod vc;
