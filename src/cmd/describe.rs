//! `type <SERVICE> <METHOD> <TYPE>`: describe a request or response message.
//!
//! TYPE is a short name matched against the method's two types; the tool's
//! description of the resolved type is returned unchanged.

use super::{OpContext, Operation, Output, expect_three};
use crate::discovery::EndpointAddress;
use crate::error::DispatchResult;
use crate::grpc::{Invocation, ToolOp};

pub struct DescribeType;

impl Operation for DescribeType {
    fn tokens(&self) -> &'static [&'static str] {
        &["type"]
    }

    fn check_args(&self, args: &[String]) -> DispatchResult<()> {
        expect_three(
            "type",
            args,
            "need to specify a service name, a method name, and a type name",
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
        let (service, method, type_name) = (&args[0], &args[1], &args[2]);

        let resolver = ctx.resolver();
        let address = resolver.resolve_endpoint(addresses, service)?;
        let full_type = resolver.resolve_full_type_name(&address, service, method, type_name)?;

        let output = ctx.client.execute(
            Invocation::new(ToolOp::Type, &address)
                .operand(full_type)
                .options(options),
        )?;
        Ok(Output::Text(output))
    }
}
