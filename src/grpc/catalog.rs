/*!
catalog.rs - service catalog queries against one endpoint.

Focus:
  - list_services: `ls <address>` minus the reflection / health meta-services
  - describe_method: `ls <address> <Service/Method> -l` (long form)
  - parse_signature: `rpc Name(Req) returns (Resp) {}` -> MethodSignature
  - signature_types: same types, tolerating an options body after them
  - last_segment: `pkg.Sub.Name` -> `Name`

Every query is a fresh tool call; nothing is cached.
*/

use crate::discovery::EndpointAddress;
use crate::error::{DispatchError, DispatchResult};
use crate::grpc::{Invocation, ToolClient, ToolOp};

pub const SERVICE_SERVER_REFLECTION: &str = "grpc.reflection.v1alpha.ServerReflection";
pub const SERVICE_HEALTH: &str = "grpc.health.v1.Health";

/// Reserved services every endpoint exposes; never shown to users.
pub fn is_meta_service(name: &str) -> bool {
    name == SERVICE_SERVER_REFLECTION || name == SERVICE_HEALTH
}

/// Keep user-facing service names from newline-delimited `ls` output.
pub fn service_names(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_meta_service(line))
        .map(str::to_string)
        .collect()
}

/// Qualified service names hosted at `address`.
pub fn list_services(client: &ToolClient<'_>, address: &EndpointAddress) -> DispatchResult<Vec<String>> {
    let output = client.execute(Invocation::new(ToolOp::Ls, address))?;
    Ok(service_names(&output))
}

/// Long-form description of a fully qualified method.
pub fn describe_method(
    client: &ToolClient<'_>,
    address: &EndpointAddress,
    full_method_name: &str,
) -> DispatchResult<String> {
    client.execute(
        Invocation::new(ToolOp::Ls, address)
            .operand(full_method_name)
            .flag("-l"),
    )
}

/// Request / response types of one method, as qualified names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub request_type: String,
    pub response_type: String,
}

fn unexpected_signature(description: &str) -> DispatchError {
    DispatchError::UnexpectedOutput(format!(
        "expected `rpc Name(Type) returns (Type)`, got {:?}",
        description.trim()
    ))
}

fn signature_from_parts(parts: &[&str]) -> MethodSignature {
    MethodSignature {
        request_type: parts[1].trim().to_string(),
        response_type: parts[3].trim().to_string(),
    }
}

/// Parse `rpc Echo(pkg.EchoRequest) returns (pkg.EchoResponse) {}`.
///
/// The trimmed text must split on `(` / `)` into exactly five parts; the
/// second and fourth are the types.
pub fn parse_signature(description: &str) -> DispatchResult<MethodSignature> {
    let parts: Vec<&str> = description.trim().split(['(', ')']).collect();
    if parts.len() != 5 {
        return Err(unexpected_signature(description));
    }
    Ok(signature_from_parts(&parts))
}

/// Like `parse_signature`, but anything after the response type is ignored,
/// so method bodies with options (`option (google.api.http) = {..};`) parse.
pub fn signature_types(description: &str) -> DispatchResult<MethodSignature> {
    let parts: Vec<&str> = description.trim().split(['(', ')']).collect();
    if parts.len() < 4 {
        return Err(unexpected_signature(description));
    }
    Ok(signature_from_parts(&parts))
}

/// Last dot-separated segment of a qualified name.
pub fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}
