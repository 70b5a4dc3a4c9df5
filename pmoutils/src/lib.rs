//! Utilitaires réseau partagés par les crates PMOSign.
//!
//! Pour l'instant un seul service : deviner l'adresse IP locale à annoncer
//! dans les URLs d'affichage (`http://<ip>:<port>/display/...`).

mod ip_utils;

pub use ip_utils::guess_local_ip;
