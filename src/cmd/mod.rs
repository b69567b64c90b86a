/*!
Command dispatcher.

Maps a command token to an `Operation` and runs it against the endpoints
found in the socket directory.

Layout:
  src/cmd/
    mod.rs       (this file: Operation trait, OpContext, dispatch table)
    list.rs      (`list` / `ls`: services, methods, request/response types)
    describe.rs  (`type`: describe a request or response message type)
    call.rs      (`call`: unary invocation)
    format.rs    (OutputMode + Output rendering)

Conventions:
  - Every operation validates its positional argument count before any
    discovery or tool call.
  - Passthrough options reach only the final, user-requested tool call(s).
*/

pub mod call;
pub mod describe;
pub mod format;
pub mod list;

use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use crate::discovery::{self, EndpointAddress};
use crate::error::{DispatchError, DispatchResult};
use crate::grpc::ToolClient;
use crate::resolve::{NameMatcher, Resolver};

pub use format::{Output, OutputMode};

/// Shared state for one command invocation.
pub struct OpContext<'a> {
    pub client: &'a ToolClient<'a>,
    pub matcher: &'a dyn NameMatcher,
    pub mode: OutputMode,
}

impl<'a> OpContext<'a> {
    pub fn new(client: &'a ToolClient<'a>, matcher: &'a dyn NameMatcher, mode: OutputMode) -> Self {
        Self {
            client,
            matcher,
            mode,
        }
    }

    pub fn resolver(&self) -> Resolver<'a> {
        Resolver::new(self.client, self.matcher)
    }
}

/// One dispatchable command.
pub trait Operation {
    /// Tokens this operation answers to.
    fn tokens(&self) -> &'static [&'static str];

    /// Reject bad positional counts without touching the network.
    fn check_args(&self, args: &[String]) -> DispatchResult<()>;

    fn execute(
        &self,
        ctx: &OpContext<'_>,
        addresses: &[EndpointAddress],
        args: &[String],
        options: &[String],
    ) -> DispatchResult<Output>;
}

/// Token -> operation table.
pub struct Dispatcher {
    table: HashMap<&'static str, Rc<dyn Operation>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        let mut dispatcher = Self {
            table: HashMap::new(),
        };
        dispatcher.register(Rc::new(list::List));
        dispatcher.register(Rc::new(describe::DescribeType));
        dispatcher.register(Rc::new(call::Call));
        dispatcher
    }
}

impl Dispatcher {
    pub fn register(&mut self, op: Rc<dyn Operation>) {
        for token in op.tokens() {
            self.table.insert(*token, Rc::clone(&op));
        }
    }

    pub fn operation(&self, command: &str) -> DispatchResult<&dyn Operation> {
        self.table
            .get(command)
            .map(|op| &**op)
            .ok_or_else(|| DispatchError::UnsupportedCommand(command.to_string()))
    }

    /// Full entry point: pick the operation, validate, discover, execute.
    pub fn execute(
        &self,
        ctx: &OpContext<'_>,
        socket_dir: &Path,
        transport_prefix: &str,
        command: &str,
        args: &[String],
        options: &[String],
    ) -> DispatchResult<Output> {
        let op = self.operation(command)?;
        op.check_args(args)?;
        let addresses = discovery::discover(socket_dir, transport_prefix)?;
        op.execute(ctx, &addresses, args, options)
    }
}

/// Exactly three positional arguments, with command-specific wording.
pub(crate) fn expect_three(
    command: &'static str,
    args: &[String],
    too_few: &'static str,
) -> DispatchResult<()> {
    if args.len() < 3 {
        return Err(DispatchError::ArgumentCount {
            command,
            message: too_few,
        });
    }
    if args.len() > 3 {
        return Err(DispatchError::ArgumentCount {
            command,
            message: "too many arguments",
        });
    }
    Ok(())
}
