// Data models for pose landmarks and repetition counting

pub mod pose;
pub mod repetition;
