/*!
`list.rs`

Implements the `list` (alias `ls`) command.

Positional forms:
  - list                    : every endpoint's services, short names only
  - list <SERVICE>          : methods of the one service matching SERVICE
  - list <SERVICE> <METHOD> : request / response type of one method

JSON Output Shapes (structured mode):
  { "services": ["Foo", "Bar"] }
  { "methods": ["Echo", "Ping"] }
  { "request_type": "EchoRequest", "response_type": "EchoResponse" }

Passthrough mode prints the tool's text instead (concatenated across
endpoints for the zero-argument form).
*/

use serde_json::json;

use super::{OpContext, Operation, Output, OutputMode};
use crate::discovery::EndpointAddress;
use crate::error::{DispatchError, DispatchResult};
use crate::grpc::catalog::{last_segment, parse_signature, service_names};
use crate::grpc::{Invocation, ToolOp};

pub struct List;

impl Operation for List {
    fn tokens(&self) -> &'static [&'static str] {
        &["list", "ls"]
    }

    fn check_args(&self, args: &[String]) -> DispatchResult<()> {
        if args.len() > 2 {
            return Err(too_many_arguments());
        }
        Ok(())
    }

    fn execute(
        &self,
        ctx: &OpContext<'_>,
        addresses: &[EndpointAddress],
        args: &[String],
        options: &[String],
    ) -> DispatchResult<Output> {
        match args {
            [] => list_all_services(ctx, addresses, options),
            [service] => list_methods(ctx, addresses, service, options),
            [service, method] => list_method_types(ctx, addresses, service, method, options),
            _ => Err(too_many_arguments()),
        }
    }
}

fn too_many_arguments() -> DispatchError {
    DispatchError::ArgumentCount {
        command: "list",
        message: "too many arguments",
    }
}

fn list_all_services(
    ctx: &OpContext<'_>,
    addresses: &[EndpointAddress],
    options: &[String],
) -> DispatchResult<Output> {
    let mut combined = String::new();
    for address in addresses {
        combined.push_str(
            &ctx.client
                .execute(Invocation::new(ToolOp::Ls, address).options(options))?,
        );
    }

    if ctx.mode == OutputMode::Passthrough {
        return Ok(Output::Text(combined));
    }
    let services: Vec<String> = service_names(&combined)
        .iter()
        .map(|name| last_segment(name).to_string())
        .collect();
    Ok(Output::Json(json!({ "services": services })))
}

fn list_methods(
    ctx: &OpContext<'_>,
    addresses: &[EndpointAddress],
    service: &str,
    options: &[String],
) -> DispatchResult<Output> {
    let target = ctx.resolver().resolve_service(addresses, service)?;
    let output = ctx.client.execute(
        Invocation::new(ToolOp::Ls, &target.address)
            .operand(target.qualified_name)
            .options(options),
    )?;

    if ctx.mode == OutputMode::Passthrough {
        return Ok(Output::Text(output));
    }
    let methods: Vec<&str> = output
        .trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    Ok(Output::Json(json!({ "methods": methods })))
}

fn list_method_types(
    ctx: &OpContext<'_>,
    addresses: &[EndpointAddress],
    service: &str,
    method: &str,
    options: &[String],
) -> DispatchResult<Output> {
    let target = ctx.resolver().resolve_method(addresses, service, method)?;
    let output = ctx.client.execute(
        Invocation::new(ToolOp::Ls, &target.address)
            .operand(target.qualified_name)
            .flag("-l")
            .options(options),
    )?;

    if ctx.mode == OutputMode::Passthrough {
        return Ok(Output::Text(output));
    }
    let signature = parse_signature(&output)?;
    Ok(Output::Json(json!({
        "request_type": last_segment(&signature.request_type),
        "response_type": last_segment(&signature.response_type),
    })))
}
