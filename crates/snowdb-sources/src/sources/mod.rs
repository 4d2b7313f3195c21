//! One adapter per external origin.

pub mod google_places;
pub mod mtnpowder;
pub mod onthesnow;
pub mod openmeteo;

pub use google_places::GooglePlacesAdapter;
pub use mtnpowder::MtnPowderAdapter;
pub use onthesnow::OnTheSnowAdapter;
pub use openmeteo::OpenMeteoAdapter;
