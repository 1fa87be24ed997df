// crates/chaincli/src/main.rs

use anyhow::Result;
use async_trait::async_trait;
use chaincore::{ExecutionEvent, Node, RoutingError, Value, ValueType};
use chainnodes::{AddNode, MultiplyNode, SubtractNode};
use chainruntime::{
    ClassificationRequest, Classifier, ClassifierConfig, GraphRegistry, OpenAiClassifier,
};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const ROUTER_DIRECTION: &str = "You are picking the next function to run. Not executing the function, just picking the next one.
If the number is even, pick multiply_by_two.
If the number is odd, pick subtract_three.";

#[derive(Parser)]
#[command(name = "chain")]
#[command(about = "Function chain CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the parity demo chain against the configured classifier
    Run {
        /// Initial input as JSON (e.g. 4)
        #[arg(short, long, default_value = "4")]
        input: String,

        /// Override the routing model
        #[arg(short, long)]
        model: Option<String>,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the demo topology without contacting the classifier
    Graph,
}

/// Stand-in used when only the topology is inspected
struct OfflineClassifier;

#[async_trait]
impl Classifier for OfflineClassifier {
    async fn classify(
        &self,
        _request: &ClassificationRequest,
    ) -> std::result::Result<serde_json::Value, RoutingError> {
        Err(RoutingError::Service("classifier is offline".to_string()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { input, model, verbose } => {
            let default_level = if verbose { "debug" } else { "info" };
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
                )
                .init();

            run_chain(input, model).await?;
        }

        Commands::Graph => {
            print_graph()?;
        }
    }

    Ok(())
}

/// `add_one -> router -> {multiply_by_two, subtract_three}`
fn build_parity_chain(classifier: Arc<dyn Classifier>) -> chaincore::Result<GraphRegistry> {
    let mut registry = GraphRegistry::new().with_classifier(classifier);

    registry.register(
        Node::transform("add_one", ValueType::Number, ValueType::Number, Arc::new(AddNode(1.0)))
            .with_description("Adds one to the number"),
    )?;
    registry.register(Node::router("router", ValueType::Number, ROUTER_DIRECTION))?;
    registry.register(
        Node::transform(
            "multiply_by_two",
            ValueType::Number,
            ValueType::Number,
            Arc::new(MultiplyNode(2.0)),
        )
        .with_description("Multiplies the number by two"),
    )?;
    registry.register(
        Node::transform(
            "subtract_three",
            ValueType::Number,
            ValueType::Number,
            Arc::new(SubtractNode(3.0)),
        )
        .with_description("Subtracts three from the number"),
    )?;

    registry.connect("add_one", "router")?;
    registry.connect("router", "multiply_by_two")?;
    registry.connect("router", "subtract_three")?;

    Ok(registry)
}

async fn run_chain(input: String, model: Option<String>) -> Result<()> {
    let json: serde_json::Value = serde_json::from_str(&input)?;
    let initial_input = Value::from_json(json);
    tracing::debug!(input = %initial_input, "Parsed initial input");

    let mut config = ClassifierConfig::from_env()?;
    if let Some(model) = model {
        config = config.with_model(model);
    }
    println!("🧭 Routing with model: {}", config.model);

    let classifier = OpenAiClassifier::new(config)?;
    let registry = build_parity_chain(Arc::new(classifier))?;

    // Subscribe to events for real-time output
    let mut events = registry.subscribe_events();
    let event_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ExecutionEvent::RunStarted { entry, input, .. } => {
                    println!("▶️  Run started at '{}' with {}", entry, input);
                }
                ExecutionEvent::StepRecorded { index, step, .. } => {
                    println!(
                        "  ✅ #{} {}: {} -> {}",
                        index,
                        step.function_name(),
                        step.input_value(),
                        step.output_value()
                    );
                }
                ExecutionEvent::RoutingDecided { router, chosen, reasoning_steps, .. } => {
                    println!("  🔀 {} chose {}", router, chosen);
                    for reason in reasoning_steps {
                        println!("     • {}", reason);
                    }
                }
                ExecutionEvent::RunCompleted { success, duration_ms, error, .. } => {
                    if success {
                        println!("✨ Run completed in {}ms", duration_ms);
                    } else {
                        println!(
                            "💥 Run failed after {}ms: {}",
                            duration_ms,
                            error.unwrap_or_default()
                        );
                    }
                    break;
                }
            }
        }
    });

    let result = registry.run(initial_input).await;
    let _ = event_task.await;
    let result = result?;

    println!();
    println!("📊 Execution Summary:");
    println!("   Execution ID: {}", result.execution_id());
    println!("   Path: {}", result.path().join(" -> "));
    println!("   Final output: {}", result.final_output());

    Ok(())
}

fn print_graph() -> Result<()> {
    let registry = build_parity_chain(Arc::new(OfflineClassifier))?;

    println!("📦 Demo chain ({} nodes, {} edges):", registry.len(), registry.edge_count());
    println!();
    for name in registry.node_names() {
        let Some(node) = registry.node(name) else {
            continue;
        };
        let kind = if node.is_routing() { "router" } else { "function" };
        println!("  • {} ({}: {} -> {})", name, kind, node.input_type(), node.output_type());
        if let Some(description) = node.description() {
            println!("    {}", description);
        }
        for next in registry.successors(name)? {
            println!("    └─ {}", next.name());
        }
    }

    println!();
    println!("Entry point: {}", registry.entry_point()?.name());
    if registry.is_cyclic() {
        println!("⚠️  Graph contains a cycle");
    }

    Ok(())
}
