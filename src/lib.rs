pub mod neuroevo;
