use crate::config::file::srv::{KEEP_ALIVE_DEFAULT, LISTEN_ADDRESSES_DEFAULT, SrvConfig};

#[derive(clap::Args, Debug, PartialEq, Default)]
#[command(about, version)]
pub struct SrvArgs {
    #[arg(help = format!("Connection keep alive timeout. [DEFAULT: {KEEP_ALIVE_DEFAULT}]"), short, long)]
    pub keep_alive: Option<u64>,
    #[arg(help = format!("The socket address to bind. [DEFAULT: {LISTEN_ADDRESSES_DEFAULT}]"), short, long)]
    pub listen_addresses: Option<String>,
    /// Path prefix under which a reverse proxy exposes this server.
    ///
    /// Only affects the URLs generated in HTML pages, the server routes remain unchanged.
    /// Must begin with a `/`.
    ///
    /// Examples: `/`, `/stac`
    #[arg(long)]
    pub base_path: Option<String>,
    /// Path prefix of all STAC API routes. Must begin with a `/`.
    ///
    /// Examples: `/api/v1`
    #[arg(long)]
    pub route_prefix: Option<String>,
    /// Number of web server workers
    #[arg(short = 'W', long)]
    pub workers: Option<usize>,
}

impl SrvArgs {
    pub(crate) fn merge_into_config(self, srv_config: &mut SrvConfig) {
        // Override config values with the ones from the command line
        if self.keep_alive.is_some() {
            srv_config.keep_alive = self.keep_alive;
        }
        if self.listen_addresses.is_some() {
            srv_config.listen_addresses = self.listen_addresses;
        }
        if self.base_path.is_some() {
            srv_config.base_path = self.base_path;
        }
        if self.route_prefix.is_some() {
            srv_config.route_prefix = self.route_prefix;
        }
        if self.workers.is_some() {
            srv_config.worker_processes = self.workers;
        }
    }
}
