//! `call <SERVICE> <METHOD> <PAYLOAD>`: one unary invocation.
//!
//! PAYLOAD is forwarded literally (JSON or protobuf text, per the configured
//! payload format) and the tool's response text comes back unchanged.
//! Streaming methods are not supported.

use super::{OpContext, Operation, Output, expect_three};
use crate::discovery::EndpointAddress;
use crate::error::DispatchResult;
use crate::grpc::{Invocation, ToolOp};
use crate::log_debug;

pub struct Call;

impl Operation for Call {
    fn tokens(&self) -> &'static [&'static str] {
        &["call"]
    }

    fn check_args(&self, args: &[String]) -> DispatchResult<()> {
        expect_three(
            "call",
            args,
            "need to specify a service name, a method name, and a message payload",
        )
    }

    fn execute(
        &self,
        ctx: &OpContext<'_>,
        addresses: &[EndpointAddress],
        args: &[String],
        options: &[String],
    ) -> DispatchResult<Output> {
        self.check_args(args)?;
        let (service, method, payload) = (&args[0], &args[1], &args[2]);

        let target = ctx.resolver().resolve_method(addresses, service, method)?;
        log_debug!("calling {} at {}", target.qualified_name, target.address);

        let output = ctx.client.execute(
            Invocation::new(ToolOp::Call, &target.address)
                .operand(target.qualified_name)
                .operand(payload.as_str())
                .options(options),
        )?;
        Ok(Output::Text(output))
    }
}
