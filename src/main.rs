mod audio;
mod config;
mod engine;
mod library;
mod mirror;
mod mpris;
mod remote;
mod runtime;
mod spotify;
mod ui;
mod viz;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
