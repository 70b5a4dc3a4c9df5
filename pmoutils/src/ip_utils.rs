use std::net::UdpSocket;

/// Devine l'adresse IP locale de la machine.
///
/// Ouvre un socket UDP et demande une "connexion" vers un DNS public
/// (8.8.8.8) : UDP étant sans connexion, aucun paquet ne part, mais le
/// système choisit l'interface de sortie et nous donne son adresse.
///
/// Retourne `"127.0.0.1"` si aucune interface de sortie n'est disponible.
///
/// # Examples
///
/// ```
/// let ip = pmoutils::guess_local_ip();
/// assert!(ip.parse::<std::net::IpAddr>().is_ok());
/// ```
pub fn guess_local_ip() -> String {
    match UdpSocket::bind("0.0.0.0:0") {
        Ok(socket) => {
            if socket.connect("8.8.8.8:80").is_ok() {
                if let Ok(local_addr) = socket.local_addr() {
                    return local_addr.ip().to_string();
                }
            }
            "127.0.0.1".to_string()
        }
        Err(_) => "127.0.0.1".to_string(),
    }
}
