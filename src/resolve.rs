//! Short-name resolution across endpoints.
//!
//! All four lookups share one rule: collect candidates with a `NameMatcher`,
//! then succeed only with exactly one (zero is NotFound, more is Ambiguous).
//! Catalogs are fetched fresh on every lookup.

use crate::discovery::EndpointAddress;
use crate::error::{DispatchError, DispatchResult};
use crate::grpc::ToolClient;
use crate::grpc::catalog::{describe_method, list_services, signature_types};
use crate::log_debug;

/// Decides whether a qualified name answers to a short name.
pub trait NameMatcher {
    fn matches(&self, qualified: &str, short: &str) -> bool;
}

/// Raw byte-suffix match: `Foo` matches `pkg.Foo` and also `pkg.SomeFoo`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SuffixMatcher;

impl NameMatcher for SuffixMatcher {
    fn matches(&self, qualified: &str, short: &str) -> bool {
        qualified.ends_with(short)
    }
}

/// Suffix match that must start at a `.` or `/` boundary (or be the whole name).
#[derive(Debug, Default, Clone, Copy)]
pub struct SegmentMatcher;

impl NameMatcher for SegmentMatcher {
    fn matches(&self, qualified: &str, short: &str) -> bool {
        match qualified.strip_suffix(short) {
            Some("") => true,
            Some(rest) => rest.ends_with(['.', '/']),
            None => false,
        }
    }
}

/// Endpoint plus the qualified name resolved there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub address: EndpointAddress,
    pub qualified_name: String,
}

fn exactly_one<T>(mut candidates: Vec<T>, short: &str) -> DispatchResult<T> {
    match candidates.len() {
        0 => Err(DispatchError::NotFound(short.to_string())),
        1 => Ok(candidates.remove(0)),
        n => {
            log_debug!("{short} matched {n} candidates");
            Err(DispatchError::Ambiguous(short.to_string()))
        }
    }
}

pub struct Resolver<'a> {
    client: &'a ToolClient<'a>,
    matcher: &'a dyn NameMatcher,
}

impl<'a> Resolver<'a> {
    pub fn new(client: &'a ToolClient<'a>, matcher: &'a dyn NameMatcher) -> Self {
        Self { client, matcher }
    }

    /// The single endpoint hosting a service that matches `service`.
    /// An endpoint counts once no matter how many of its services match.
    pub fn resolve_endpoint(
        &self,
        addresses: &[EndpointAddress],
        service: &str,
    ) -> DispatchResult<EndpointAddress> {
        let mut candidates = Vec::new();
        for address in addresses {
            let services = list_services(self.client, address)?;
            if services.iter().any(|s| self.matcher.matches(s, service)) {
                candidates.push(address.clone());
            }
        }
        let address = exactly_one(candidates, service)?;
        log_debug!("{service} -> {address}");
        Ok(address)
    }

    pub fn resolve_full_service_name(
        &self,
        address: &EndpointAddress,
        service: &str,
    ) -> DispatchResult<String> {
        let candidates = list_services(self.client, address)?
            .into_iter()
            .filter(|s| self.matcher.matches(s, service))
            .collect();
        exactly_one(candidates, service)
    }

    /// `<full service>/<method>`; the method itself is checked by the tool later.
    pub fn resolve_full_method_name(
        &self,
        address: &EndpointAddress,
        service: &str,
        method: &str,
    ) -> DispatchResult<String> {
        let full_service = self.resolve_full_service_name(address, service)?;
        Ok(format!("{full_service}/{method}"))
    }

    /// Match `type_name` against the request and response types of the method.
    pub fn resolve_full_type_name(
        &self,
        address: &EndpointAddress,
        service: &str,
        method: &str,
        type_name: &str,
    ) -> DispatchResult<String> {
        let full_method = self.resolve_full_method_name(address, service, method)?;
        let signature = signature_types(&describe_method(self.client, address, &full_method)?)?;

        let mut candidates = Vec::new();
        for ty in [signature.request_type, signature.response_type] {
            if self.matcher.matches(&ty, type_name) && !candidates.contains(&ty) {
                candidates.push(ty);
            }
        }
        exactly_one(candidates, type_name)
    }

    /// Endpoint and full service name in one step.
    pub fn resolve_service(
        &self,
        addresses: &[EndpointAddress],
        service: &str,
    ) -> DispatchResult<ResolvedTarget> {
        let address = self.resolve_endpoint(addresses, service)?;
        let qualified_name = self.resolve_full_service_name(&address, service)?;
        Ok(ResolvedTarget {
            address,
            qualified_name,
        })
    }

    /// Endpoint and full method name in one step.
    pub fn resolve_method(
        &self,
        addresses: &[EndpointAddress],
        service: &str,
        method: &str,
    ) -> DispatchResult<ResolvedTarget> {
        let address = self.resolve_endpoint(addresses, service)?;
        let qualified_name = self.resolve_full_method_name(&address, service, method)?;
        Ok(ResolvedTarget {
            address,
            qualified_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grpc::fake::FakeTool;
    use crate::grpc::{FlagPolicy, PayloadFormat};

    const E1: &str = "unix:/s/e1";
    const E2: &str = "unix:/s/e2";

    fn plain() -> FlagPolicy {
        FlagPolicy {
            payload_format: PayloadFormat::Json,
            force_default_flags: false,
        }
    }

    fn endpoints(names: &[&str]) -> Vec<EndpointAddress> {
        names.iter().map(|n| EndpointAddress::new(*n)).collect()
    }

    fn two_endpoints(e1: &str, e2: &str) -> FakeTool {
        FakeTool::new()
            .reply(&["ls", E1], e1)
            .reply(&["ls", E2], e2)
    }

    #[test]
    fn suffix_matcher_is_raw() {
        assert!(SuffixMatcher.matches("pkg.Foo", "Foo"));
        assert!(SuffixMatcher.matches("pkg.SomeFoo", "Foo"));
        assert!(SuffixMatcher.matches("a.b.Foo", "b.Foo"));
        assert!(!SuffixMatcher.matches("pkg.Foo", "Bar"));
    }

    #[test]
    fn segment_matcher_needs_a_boundary() {
        assert!(SegmentMatcher.matches("pkg.Foo", "Foo"));
        assert!(SegmentMatcher.matches("Foo", "Foo"));
        assert!(SegmentMatcher.matches("pkg.Foo/Echo", "Echo"));
        assert!(!SegmentMatcher.matches("pkg.SomeFoo", "Foo"));
    }

    #[test]
    fn unique_service_resolves_to_its_endpoint_in_any_order() {
        let tool = two_endpoints("pkg.Foo\n", "pkg2.Bar\n");
        let client = ToolClient::new(&tool, plain());
        let resolver = Resolver::new(&client, &SuffixMatcher);

        for order in [[E1, E2], [E2, E1]] {
            let target = resolver.resolve_service(&endpoints(&order), "Foo").unwrap();
            assert_eq!(target.address.as_str(), E1);
            assert_eq!(target.qualified_name, "pkg.Foo");
        }
    }

    #[test]
    fn unknown_service_is_not_found() {
        let tool = two_endpoints("pkg.Foo\n", "pkg2.Bar\n");
        let client = ToolClient::new(&tool, plain());
        let resolver = Resolver::new(&client, &SuffixMatcher);

        let err = resolver
            .resolve_endpoint(&endpoints(&[E1, E2]), "Baz")
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotFound(ref s) if s == "Baz"));
    }

    #[test]
    fn service_on_two_endpoints_is_ambiguous_in_any_order() {
        let tool = two_endpoints("a.b.Foo\n", "x.y.Foo\n");
        let client = ToolClient::new(&tool, plain());
        let resolver = Resolver::new(&client, &SuffixMatcher);

        for order in [[E1, E2], [E2, E1]] {
            let err = resolver
                .resolve_endpoint(&endpoints(&order), "Foo")
                .unwrap_err();
            assert!(matches!(err, DispatchError::Ambiguous(ref s) if s == "Foo"));
        }
    }

    #[test]
    fn endpoint_counts_once_but_full_name_is_ambiguous() {
        let tool = two_endpoints("a.Foo\nb.Foo\n", "pkg2.Bar\n");
        let client = ToolClient::new(&tool, plain());
        let resolver = Resolver::new(&client, &SuffixMatcher);
        let addrs = endpoints(&[E1, E2]);

        let address = resolver.resolve_endpoint(&addrs, "Foo").unwrap();
        assert_eq!(address.as_str(), E1);
        let err = resolver
            .resolve_full_service_name(&address, "Foo")
            .unwrap_err();
        assert!(matches!(err, DispatchError::Ambiguous(_)));
        // a longer suffix disambiguates
        assert_eq!(
            resolver.resolve_full_service_name(&address, "a.Foo").unwrap(),
            "a.Foo"
        );
    }

    #[test]
    fn raw_suffix_can_match_across_segments() {
        let tool = two_endpoints("pkg.SomeFoo\n", "pkg2.Bar\n");
        let client = ToolClient::new(&tool, plain());

        let raw = Resolver::new(&client, &SuffixMatcher);
        assert_eq!(
            raw.resolve_endpoint(&endpoints(&[E1, E2]), "Foo")
                .unwrap()
                .as_str(),
            E1
        );

        let strict = Resolver::new(&client, &SegmentMatcher);
        assert!(matches!(
            strict.resolve_endpoint(&endpoints(&[E1, E2]), "Foo"),
            Err(DispatchError::NotFound(_))
        ));
    }

    #[test]
    fn method_name_is_concatenated_unchecked() {
        let tool = FakeTool::new().reply(&["ls", E1], "pkg.Foo\n");
        let client = ToolClient::new(&tool, plain());
        let resolver = Resolver::new(&client, &SuffixMatcher);

        let full = resolver
            .resolve_full_method_name(&EndpointAddress::new(E1), "Foo", "NoSuchMethod")
            .unwrap();
        assert_eq!(full, "pkg.Foo/NoSuchMethod");
        assert_eq!(tool.call_count(), 1);
    }

    #[test]
    fn type_resolves_against_request_and_response() {
        let tool = FakeTool::new()
            .reply(&["ls", E1], "pkg.Foo\n")
            .reply(
                &["ls", E1, "pkg.Foo/Echo", "-l"],
                "rpc Echo(pkg.EchoRequest) returns (pkg.EchoResponse) {}\n",
            );
        let client = ToolClient::new(&tool, plain());
        let resolver = Resolver::new(&client, &SuffixMatcher);
        let e1 = EndpointAddress::new(E1);

        assert_eq!(
            resolver
                .resolve_full_type_name(&e1, "Foo", "Echo", "EchoRequest")
                .unwrap(),
            "pkg.EchoRequest"
        );
        assert_eq!(
            resolver
                .resolve_full_type_name(&e1, "Foo", "Echo", "Response")
                .unwrap(),
            "pkg.EchoResponse"
        );
        let err = resolver
            .resolve_full_type_name(&e1, "Foo", "Echo", "Echo")
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotFound(ref s) if s == "Echo"));
    }

    #[test]
    fn type_resolves_when_method_has_options() {
        let tool = FakeTool::new()
            .reply(&["ls", E1], "pkg.Foo\n")
            .reply(
                &["ls", E1, "pkg.Foo/Echo", "-l"],
                "rpc Echo(pkg.EchoRequest) returns (pkg.EchoResponse) {\n  option (google.api.http) = { post: \"/v1/echo\" };\n}\n",
            );
        let client = ToolClient::new(&tool, plain());
        let resolver = Resolver::new(&client, &SuffixMatcher);

        let full = resolver
            .resolve_full_type_name(&EndpointAddress::new(E1), "Foo", "Echo", "EchoRequest")
            .unwrap();
        assert_eq!(full, "pkg.EchoRequest");
    }

    #[test]
    fn shared_request_and_response_type_is_one_candidate() {
        let tool = FakeTool::new()
            .reply(&["ls", E1], "pkg.Foo\n")
            .reply(
                &["ls", E1, "pkg.Foo/Ping", "-l"],
                "rpc Ping(google.protobuf.Empty) returns (google.protobuf.Empty) {}\n",
            );
        let client = ToolClient::new(&tool, plain());
        let resolver = Resolver::new(&client, &SuffixMatcher);

        let full = resolver
            .resolve_full_type_name(&EndpointAddress::new(E1), "Foo", "Ping", "Empty")
            .unwrap();
        assert_eq!(full, "google.protobuf.Empty");
    }

    #[test]
    fn ambiguous_type_suffix() {
        let tool = FakeTool::new()
            .reply(&["ls", E1], "pkg.Foo\n")
            .reply(
                &["ls", E1, "pkg.Foo/Echo", "-l"],
                "rpc Echo(pkg.EchoMessage) returns (other.EchoMessage) {}\n",
            );
        let client = ToolClient::new(&tool, plain());
        let resolver = Resolver::new(&client, &SuffixMatcher);

        let err = resolver
            .resolve_full_type_name(&EndpointAddress::new(E1), "Foo", "Echo", "EchoMessage")
            .unwrap_err();
        assert!(matches!(err, DispatchError::Ambiguous(_)));
    }

    #[test]
    fn tool_failure_stops_resolution() {
        // E2 has no scripted reply, so its listing fails.
        let tool = FakeTool::new().reply(&["ls", E1], "pkg.Foo\n");
        let client = ToolClient::new(&tool, plain());
        let resolver = Resolver::new(&client, &SuffixMatcher);

        let err = resolver
            .resolve_endpoint(&endpoints(&[E1, E2]), "Foo")
            .unwrap_err();
        assert!(matches!(err, DispatchError::ToolFailure { .. }));
    }
}
