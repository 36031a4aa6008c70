// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A thin diagnostic binary over the clusterlib facade. No production
//! `Repository` ships in this workspace (see `clusterlib-repository`), so
//! this binary always runs against the in-memory fake — useful for
//! poking at the object model and smoke-testing a runbook of operations,
//! not for talking to a real cluster.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use clusterlib::{ClusterObject, Factory, Root};
use clusterlib_core::ClusterlibConfig;
use clusterlib_repository::InMemoryRepository;

#[derive(Parser)]
#[command(name = "clusterlib-cli", about = "Diagnostics for the clusterlib object model")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create (or attach to) an application, printing its key.
    Application { name: String },
    /// Create (or attach to) a group under an application.
    Group { application: String, name: String },
    /// Set a property list entry and publish it.
    SetProperty { application: String, list: String, key: String, value: String },
    /// Read a property list entry.
    GetProperty { application: String, list: String, key: String },
    /// Enqueue a byte-string element on a group's queue.
    QueuePut { application: String, group: String, queue: String, element: String },
    /// Dequeue the lowest-sequence element, if any.
    QueueTake { application: String, group: String, queue: String },
    /// Bid for leadership of a group and report the outcome.
    BidForLeadership { application: String, group: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let repo: Arc<dyn clusterlib_repository::Repository> = Arc::new(InMemoryRepository::new());
    let factory = Factory::new(repo, ClusterlibConfig::default());
    let root = Root::new(factory.clone());

    match cli.command {
        Command::Application { name } => {
            let app = root.application(&name, true).await?.context("application create returned none")?;
            println!("{}", app.key());
        }
        Command::Group { application, name } => {
            let app = root.application(&application, true).await?.context("no such application")?;
            let group = app.group(&name, true).await?.context("group create returned none")?;
            println!("{}", group.key());
        }
        Command::SetProperty { application, list, key, value } => {
            let app = root.application(&application, true).await?.context("no such application")?;
            let props = app.property_list(&list, true).await?.context("property list create returned none")?;
            props.set(key, value).await;
            props.publish().await?;
        }
        Command::GetProperty { application, list, key } => {
            let app = root.application(&application, true).await?.context("no such application")?;
            let props = app.property_list(&list, false).await?.context("no such property list")?;
            match props.get(&key).await {
                Some(value) => println!("{value}"),
                None => println!("(unset)"),
            }
        }
        Command::QueuePut { application, group, queue, element } => {
            let app = root.application(&application, true).await?.context("no such application")?;
            let group = app.group(&group, true).await?.context("no such group")?;
            let queue = group.queue(&queue, true).await?.context("queue create returned none")?;
            let path = queue.put(element.as_bytes()).await?;
            println!("{path}");
        }
        Command::QueueTake { application, group, queue } => {
            let app = root.application(&application, true).await?.context("no such application")?;
            let group = app.group(&group, true).await?.context("no such group")?;
            let queue = group.queue(&queue, false).await?.context("no such queue")?;
            match queue.take().await? {
                Some(bytes) => println!("{}", String::from_utf8_lossy(&bytes)),
                None => println!("(empty)"),
            }
        }
        Command::BidForLeadership { application, group } => {
            let app = root.application(&application, true).await?.context("no such application")?;
            let group = app.group(&group, true).await?.context("no such group")?;
            let bid = group.bid_for_leadership().await?;
            println!("{:?}", bid.status);
        }
    }

    factory.shutdown().await;
    Ok(())
}
