// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-FileCopyrightText: © 2023 Claudio Cicconetti <c.cicconetti@iit.cnr.it>
// SPDX-FileCopyrightText: © 2023 Siemens AG
// SPDX-License-Identifier: MIT
use clap::Parser;

#[derive(Debug, clap::Parser)]
#[command(long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = String::from("node.toml"))]
    config_file: String,
    #[arg(short, long, default_value_t = String::from(""))]
    template: String,
}

fn read_conf_from_file(filename: &str) -> anyhow::Result<coaplight_node::CoapLightNodeSettings> {
    Ok(toml::from_str::<coaplight_node::CoapLightNodeSettings>(&std::fs::read_to_string(
        filename,
    )?)?)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    // Create a template node configuration and exit.
    if !args.template.is_empty() {
        coaplight_node::util::create_template(&args.template, coaplight_node::coaplight_node_default_conf().as_str())?;
        return Ok(());
    }

    let conf = read_conf_from_file(&args.config_file)?;

    // Requests are served one at a time, a single thread is enough.
    let async_runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    async_runtime.block_on(coaplight_node::coaplight_node_main(conf))
}
