pub mod error;

pub mod core {
    pub mod competitor;
    pub mod forecast;
    pub mod handle_championship;
    pub mod metrics;
    pub mod schedule;
    pub mod scoring;
    pub mod simulator;
}

pub mod interfaces {
    pub mod worker_interface;
}

pub mod post {
    pub mod championship_result;
}

pub mod pre {
    pub mod read_sim_config;
    pub mod read_snapshot;
    pub mod sim_opts;
}
