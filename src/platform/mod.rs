// Platform integrations - the external pose module lives behind `pose`

pub mod pose;
