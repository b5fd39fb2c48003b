//! Sample tools and resources backed by a [`DataStore`].
//!
//! Business negatives such as an unknown user are reported inside the
//! successful payload (`"success": false`), never as handler errors.

use std::sync::Arc;

use bridge_registry::{
    HandlerRegistry, ParamKind, ParamSpec, ParameterBag, ResourceContent, ResourceDescriptor,
    ResourceMetadata, ToolDescriptor, ToolError, ToolMetadata, ToolResult,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Number, Value, json};

use crate::error::StoreError;
use crate::numeric;
use crate::store::DataStore;

/// Builds a registry holding the full sample catalog over `store`.
///
/// # Errors
///
/// Returns [`ToolError`] if any registration fails.
pub fn sample_registry(store: &Arc<DataStore>) -> ToolResult<HandlerRegistry> {
    let mut registry = HandlerRegistry::new();
    register_catalog(&mut registry, store)?;
    Ok(registry)
}

/// Registers the sample tools and resources into `registry`.
///
/// # Errors
///
/// Returns [`ToolError::DuplicateTool`] or [`ToolError::DuplicateResource`]
/// when `registry` already holds one of the catalog names.
pub fn register_catalog(registry: &mut HandlerRegistry, store: &Arc<DataStore>) -> ToolResult<()> {
    registry.register_tool(ToolDescriptor::new(
        ToolMetadata::new("add_numbers")?
            .with_description("Add two numbers together")
            .with_parameter(ParamSpec::required("a", ParamKind::Number))
            .with_parameter(ParamSpec::required("b", ParamKind::Number)),
        |input: ParameterBag| async move { add_numbers(input) },
    ))?;

    registry.register_tool(ToolDescriptor::new(
        ToolMetadata::new("multiply_numbers")?
            .with_description("Multiply two numbers")
            .with_parameter(ParamSpec::required("a", ParamKind::Number))
            .with_parameter(ParamSpec::required("b", ParamKind::Number)),
        |input: ParameterBag| async move { multiply_numbers(input) },
    ))?;

    registry.register_tool(ToolDescriptor::new(
        ToolMetadata::new("calculate_statistics")?
            .with_description("Calculate count, sum, mean, min and max for a list of numbers")
            .with_parameter(ParamSpec::required(
                "numbers",
                ParamKind::array_of(ParamKind::Number),
            )),
        |input: ParameterBag| async move { calculate_statistics(input) },
    ))?;

    let shared = Arc::clone(store);
    registry.register_tool(ToolDescriptor::new(
        ToolMetadata::new("get_user")?
            .with_description("Retrieve a user by id")
            .with_parameter(ParamSpec::required("user_id", ParamKind::Integer)),
        move |input: ParameterBag| {
            let store = Arc::clone(&shared);
            async move { get_user(&store, input).await }
        },
    ))?;

    let shared = Arc::clone(store);
    registry.register_tool(ToolDescriptor::new(
        ToolMetadata::new("list_users")?.with_description("List all users"),
        move |_: ParameterBag| {
            let store = Arc::clone(&shared);
            async move { list_users(&store).await }
        },
    ))?;

    let shared = Arc::clone(store);
    registry.register_tool(ToolDescriptor::new(
        ToolMetadata::new("get_tasks")?
            .with_description("Get tasks, optionally filtered by status")
            .with_parameter(
                ParamSpec::optional("filter_status", ParamKind::String)
                    .with_description("completed, in_progress or pending"),
            ),
        move |input: ParameterBag| {
            let store = Arc::clone(&shared);
            async move { get_tasks(&store, input).await }
        },
    ))?;

    let shared = Arc::clone(store);
    registry.register_tool(ToolDescriptor::new(
        ToolMetadata::new("create_task")?
            .with_description("Create a pending task assigned to an existing user")
            .with_parameter(ParamSpec::required("title", ParamKind::String))
            .with_parameter(ParamSpec::required("assigned_to", ParamKind::Integer)),
        move |input: ParameterBag| {
            let store = Arc::clone(&shared);
            async move { create_task(&store, input).await }
        },
    ))?;

    let shared = Arc::clone(store);
    registry.register_resource(ResourceDescriptor::new(
        ResourceMetadata::new("data://users/list")?.with_description("All users"),
        move || {
            let store = Arc::clone(&shared);
            async move {
                let users = store.users().await;
                pretty(&json!({ "count": users.len(), "users": users }))
            }
        },
    ))?;

    let shared = Arc::clone(store);
    registry.register_resource(ResourceDescriptor::new(
        ResourceMetadata::new("data://config")?.with_description("Application configuration"),
        move || {
            let store = Arc::clone(&shared);
            async move { pretty(&store.settings().await) }
        },
    ))?;

    let shared = Arc::clone(store);
    registry.register_resource(ResourceDescriptor::new(
        ResourceMetadata::new("data://summary")?.with_description("Aggregate user and task counts"),
        move || {
            let store = Arc::clone(&shared);
            async move { pretty(&store.summary().await) }
        },
    ))?;

    Ok(())
}

#[derive(Deserialize)]
struct Operands {
    a: Number,
    b: Number,
}

#[derive(Deserialize)]
struct StatisticsArgs {
    numbers: Vec<Number>,
}

#[derive(Deserialize)]
struct UserArgs {
    user_id: i64,
}

#[derive(Deserialize)]
struct TaskFilter {
    #[serde(default)]
    filter_status: Option<String>,
}

#[derive(Deserialize)]
struct NewTask {
    title: String,
    assigned_to: i64,
}

fn args<T: DeserializeOwned>(input: ParameterBag) -> ToolResult<T> {
    serde_json::from_value(Value::Object(input))
        .map_err(|err| ToolError::execution(format!("malformed arguments: {err}")))
}

fn pretty<T: serde::Serialize>(value: &T) -> ToolResult<ResourceContent> {
    serde_json::to_string_pretty(value)
        .map(ResourceContent::Text)
        .map_err(|err| ToolError::execution(err.to_string()))
}

fn non_finite() -> ToolError {
    ToolError::execution("result is not a finite number")
}

fn add_numbers(input: ParameterBag) -> ToolResult<Value> {
    let Operands { a, b } = args(input)?;
    let result = numeric::add(&a, &b).ok_or_else(non_finite)?;
    Ok(json!({ "operation": "addition", "a": a, "b": b, "result": result }))
}

fn multiply_numbers(input: ParameterBag) -> ToolResult<Value> {
    let Operands { a, b } = args(input)?;
    let result = numeric::multiply(&a, &b).ok_or_else(non_finite)?;
    Ok(json!({ "operation": "multiplication", "a": a, "b": b, "result": result }))
}

fn calculate_statistics(input: ParameterBag) -> ToolResult<Value> {
    let StatisticsArgs { numbers } = args(input)?;
    if numbers.is_empty() {
        return Ok(json!({ "error": "Empty list provided" }));
    }

    let stats = numeric::statistics(&numbers).ok_or_else(non_finite)?;
    Ok(json!({
        "count": stats.count,
        "sum": stats.sum,
        "mean": stats.mean,
        "min": stats.min,
        "max": stats.max,
    }))
}

async fn get_user(store: &DataStore, input: ParameterBag) -> ToolResult<Value> {
    let UserArgs { user_id } = args(input)?;
    Ok(match store.user(user_id).await {
        Some(user) => json!({ "success": true, "user": user }),
        None => json!({
            "success": false,
            "error": StoreError::UnknownUser(user_id).to_string(),
        }),
    })
}

async fn list_users(store: &DataStore) -> ToolResult<Value> {
    let users = store.users().await;
    Ok(json!({ "success": true, "count": users.len(), "users": users }))
}

async fn get_tasks(store: &DataStore, input: ParameterBag) -> ToolResult<Value> {
    let TaskFilter { filter_status } = args(input)?;
    // An empty filter means "all tasks".
    let status = filter_status.as_deref().filter(|status| !status.is_empty());
    let tasks = store.tasks(status).await;
    Ok(json!({ "success": true, "count": tasks.len(), "tasks": tasks }))
}

async fn create_task(store: &DataStore, input: ParameterBag) -> ToolResult<Value> {
    let NewTask { title, assigned_to } = args(input)?;
    match store.create_task(title, assigned_to).await {
        Ok(task) => Ok(json!({
            "success": true,
            "message": "Task created successfully",
            "task": task,
        })),
        Err(err @ StoreError::UnknownUser(_)) => {
            Ok(json!({ "success": false, "error": err.to_string() }))
        }
        Err(err @ StoreError::IdExhausted) => Err(ToolError::execution(err.to_string())),
    }
}
