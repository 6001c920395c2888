//! Storefront service binary. See `storefront_lib` for details.

extern crate storefront_lib;

fn main() {
    let config = storefront_lib::config::Config::new().expect("Can't load app config!");

    // Prepare logger
    storefront_lib::logging::init(&config.logging);

    storefront_lib::start_server(config, &None, || ());
}
