pub mod firebase;
pub mod groq;
pub mod pathway;
