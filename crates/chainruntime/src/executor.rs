use crate::classifier::Classifier;
use crate::config::RuntimeConfig;
use crate::registry::GraphRegistry;
use crate::router::{FunctionChoice, RoutingNode};
use chaincore::{
    ChainError, EventBus, ExecutionEvent, ExecutionId, ExecutionResult, GraphError, Node, Result,
    RoutingError, Step, Value,
};
use chrono::Utc;
use petgraph::graph::NodeIndex;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Traversal states of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SelectEntry,
    ExecuteNode(NodeIndex),
    Decide(NodeIndex),
    Terminal,
}

/// Step trace of the run in progress
struct Trace<'a> {
    execution_id: ExecutionId,
    steps: Vec<Step>,
    events: &'a EventBus,
}

impl<'a> Trace<'a> {
    fn new(execution_id: ExecutionId, events: &'a EventBus) -> Self {
        Self {
            execution_id,
            steps: Vec::new(),
            events,
        }
    }

    fn record(&mut self, step: Step) {
        tracing::debug!(
            step = self.steps.len(),
            function = %step.function_name(),
            input = %step.input_value(),
            output = %step.output_value(),
            "Recorded step"
        );
        self.events.emit(ExecutionEvent::StepRecorded {
            execution_id: self.execution_id,
            index: self.steps.len(),
            step: step.clone(),
            timestamp: Utc::now(),
        });
        self.steps.push(step);
    }
}

/// Walks a registry from its entry point to a terminal node
pub struct ChainExecutor {
    max_steps: Option<usize>,
    routing_timeout: Option<Duration>,
    system_prompt: String,
}

impl ChainExecutor {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            max_steps: config.max_steps,
            routing_timeout: config.routing_timeout,
            system_prompt: config.system_prompt.clone(),
        }
    }

    /// Run the chain once, then notify callbacks
    pub async fn execute(
        &self,
        registry: &GraphRegistry,
        initial_input: Value,
        cancel: CancellationToken,
    ) -> Result<ExecutionResult> {
        let execution_id = ExecutionId::new_v4();
        let start_time = Instant::now();
        let events = registry.event_bus();
        let mut trace = Trace::new(execution_id, events);

        let result = match self
            .traverse(registry, &mut trace, initial_input, &cancel)
            .await
        {
            Ok(run) => self.notify(registry, &run).map(|()| run),
            Err(e) => Err(e),
        };

        let duration_ms = start_time.elapsed().as_millis() as u64;
        let steps = match &result {
            Ok(run) => {
                tracing::info!(%execution_id, final_output = %run.final_output(), duration_ms, "Run completed");
                run.steps().len()
            }
            Err(e) => {
                tracing::error!(%execution_id, error = %e, duration_ms, "Run failed");
                trace.steps.len()
            }
        };

        events.emit(ExecutionEvent::RunCompleted {
            execution_id,
            success: result.is_ok(),
            steps,
            duration_ms,
            error: result.as_ref().err().map(|e| e.to_string()),
            timestamp: Utc::now(),
        });

        result
    }

    async fn traverse(
        &self,
        registry: &GraphRegistry,
        trace: &mut Trace<'_>,
        initial_input: Value,
        cancel: &CancellationToken,
    ) -> Result<ExecutionResult> {
        let mut state = State::SelectEntry;
        let mut value = initial_input;

        loop {
            state = match state {
                State::SelectEntry => {
                    let entry = registry.entry_index()?;
                    if registry.is_cyclic() {
                        tracing::warn!(
                            max_steps = ?self.max_steps,
                            "Graph contains a cycle; traversal is bounded only by the step limit"
                        );
                    }
                    let entry_name = registry.node_at(entry).name().to_string();
                    tracing::info!(execution_id = %trace.execution_id, entry = %entry_name, "Starting run");
                    trace.events.emit(ExecutionEvent::RunStarted {
                        execution_id: trace.execution_id,
                        entry: entry_name,
                        input: value.clone(),
                        timestamp: Utc::now(),
                    });
                    State::ExecuteNode(entry)
                }

                State::ExecuteNode(idx) => {
                    self.check_budget(trace, cancel)?;
                    let node = registry.node_at(idx);
                    if node.is_routing() {
                        State::Decide(idx)
                    } else {
                        let successors = registry.successor_indices(idx);
                        if successors.len() > 1 {
                            return Err(GraphError::BranchingWithoutRouter(node.name().to_string()).into());
                        }
                        let output = execute_node(node, value.clone()).await?;
                        trace.record(Step::new(node.name(), value, output.clone()));
                        value = output;
                        match successors.first() {
                            Some(next) => State::ExecuteNode(*next),
                            None => State::Terminal,
                        }
                    }
                }

                State::Decide(idx) => {
                    let node = registry.node_at(idx);
                    let routing = RoutingNode::new(node, registry.successors_at(idx)).ok_or_else(|| {
                        ChainError::Configuration(format!("'{}' is not a routing node", node.name()))
                    })?;
                    let classifier = registry.classifier().ok_or_else(|| {
                        ChainError::Configuration(format!(
                            "routing node '{}' reached without a classifier",
                            node.name()
                        ))
                    })?;

                    let (next, choice) = self
                        .decide(&routing, &**classifier, &value, cancel)
                        .await?;

                    let output = execute_node(node, value.clone()).await?;
                    trace.record(Step::new(node.name(), value, output.clone()));
                    value = output;

                    trace.events.emit(ExecutionEvent::RoutingDecided {
                        execution_id: trace.execution_id,
                        router: node.name().to_string(),
                        chosen: next.name().to_string(),
                        reasoning_steps: choice.reasoning_steps,
                        timestamp: Utc::now(),
                    });
                    State::ExecuteNode(registry.index_of(next.name())?)
                }

                State::Terminal => {
                    tracing::info!(final_output = %value, "Final output");
                    return Ok(ExecutionResult::new(
                        trace.execution_id,
                        std::mem::take(&mut trace.steps),
                        value,
                    ));
                }
            };
        }
    }

    /// Query the classifier, bounded by the routing deadline and the token
    async fn decide<'a>(
        &self,
        routing: &RoutingNode<'a>,
        classifier: &dyn Classifier,
        value: &Value,
        cancel: &CancellationToken,
    ) -> Result<(&'a Node, FunctionChoice)> {
        let decision = routing.decide_path(classifier, &self.system_prompt, value);
        let bounded = async {
            match self.routing_timeout {
                Some(limit) => match tokio::time::timeout(limit, decision).await {
                    Ok(result) => result,
                    Err(_) => Err(RoutingError::Timeout(limit.as_millis() as u64)),
                },
                None => decision.await,
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ChainError::Cancelled),
            result = bounded => result.map_err(|e| ChainError::routing(routing.name(), e)),
        }
    }

    fn check_budget(&self, trace: &Trace<'_>, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(ChainError::Cancelled);
        }
        if let Some(limit) = self.max_steps {
            if trace.steps.len() >= limit {
                return Err(GraphError::StepLimitExceeded(limit).into());
            }
        }
        Ok(())
    }

    fn notify(&self, registry: &GraphRegistry, run: &ExecutionResult) -> Result<()> {
        for (index, callback) in registry.callbacks().iter().enumerate() {
            callback
                .on_complete(registry, run)
                .map_err(|source| ChainError::Callback { index, source })?;
        }
        Ok(())
    }
}

async fn execute_node(node: &Node, input: Value) -> Result<Value> {
    node.execute(input)
        .await
        .map_err(|e| ChainError::node(node.name(), e))
}
