pub mod artwork;
