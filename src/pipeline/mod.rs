pub mod vision;
pub mod vitals; // Monitor photo → charted vital reading
