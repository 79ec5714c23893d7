//! Where's the Craic: nearby pubs, live crowd levels and check-in tags.
//!
//! | Module      | Responsibility                                         |
//! |-------------|--------------------------------------------------------|
//! | `checkin`   | Check-in sync, records, session reducer, tag catalogue |
//! | `config`    | `craic.toml` + environment layering                    |
//! | `crowd`     | Crowd count → tier mapping                             |
//! | `discovery` | Nearby search merged with crowd counts                 |
//! | `errors`    | Typed errors per subsystem                             |
//! | `geo`       | Coordinates and great-circle distance                  |
//! | `location`  | Device position with fallback                          |
//! | `logging`   | Tracing subscriber setup                               |
//! | `places`    | Places provider client (nearby, details, photos)       |
//! | `store`     | Document store backends (memory, SQLite, Firestore)    |

pub mod checkin;
pub mod config;
pub mod crowd;
pub mod discovery;
pub mod errors;
pub mod geo;
pub mod location;
pub mod logging;
pub mod places;
pub mod store;
