//! Parser kinds (spec.md §3 "Parser", §4.A) and their dispatch.
//!
//! The teacher dispatches through `Rc<dyn IProduction>` trait objects, one
//! struct per production shape. A parser kind here carries no children and
//! no recursion of its own (`repeat` and the named-type reference aside), so
//! a closed enum dispatched by match is the better fit — spec.md §9 asks for
//! exactly this ("construct/parse/destroy dispatched through a small table
//! keyed by a 0-based kind id" rather than a vtable per kind).
//!
//! Every non-matching parser returns `Err(WrongParser)`, never a generic
//! `None`/`bool` — `crate::matcher` relies on that to tell "this parser
//! isn't applicable here, try the next edge" apart from a genuine bug.

mod combinators;
mod datetime;
mod network;
pub mod numeric;
mod structured;
pub mod text;

use crate::error::WrongParser;
use crate::value::Value;
use std::rc::Rc;

pub use combinators::{RepeatConfig, TypeRefConfig};

/// The outcome of a successful parse: how many bytes of `input[offset..]`
/// were consumed, and the value the parser would contribute if its edge
/// captures a field.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub consumed: usize,
    pub value: Value,
}

impl Parsed {
    pub fn new(consumed: usize, value: Value) -> Self {
        Parsed { consumed, value }
    }

    /// Build a `Parsed` whose value is the raw matched substring, the
    /// common case for parsers that don't decompose their match further.
    pub fn slice(input: &[u8], offset: usize, consumed: usize) -> Self {
        let text = String::from_utf8_lossy(&input[offset..offset + consumed]).into_owned();
        Parsed { consumed, value: Value::String(text) }
    }
}

pub type ParseOutcome = Result<Parsed, WrongParser>;

macro_rules! kind_ids {
    ($($name:ident = $id:expr),* $(,)?) => {
        $(pub const $name: u8 = $id;)*
    };
}

kind_ids! {
    KIND_LITERAL = 0,
    KIND_DATE_RFC3164 = 1,
    KIND_DATE_RFC5424 = 2,
    KIND_NUMBER = 3,
    KIND_FLOAT = 4,
    KIND_HEXNUMBER = 5,
    KIND_KERNEL_TIMESTAMP = 6,
    KIND_WHITESPACE = 7,
    KIND_IPV4 = 8,
    KIND_IPV6 = 9,
    KIND_WORD = 10,
    KIND_ALPHA = 11,
    KIND_REST = 12,
    KIND_OP_QUOTED_STRING = 13,
    KIND_QUOTED_STRING = 14,
    KIND_DATE_ISO = 15,
    KIND_TIME_24HR = 16,
    KIND_TIME_12HR = 17,
    KIND_DURATION = 18,
    KIND_CISCO_INTERFACE_SPEC = 19,
    KIND_NAME_VALUE_LIST = 20,
    KIND_JSON = 21,
    KIND_CEE_SYSLOG = 22,
    KIND_MAC48 = 23,
    KIND_CEF = 24,
    KIND_CHECKPOINT_LEA = 25,
    KIND_V2_IPTABLES = 26,
    KIND_STRING_TO = 27,
    KIND_CHAR_TO = 28,
    KIND_CHAR_SEP = 29,
    KIND_REPEAT = 30,
    KIND_TYPE_REF = 31,
    KIND_REGEX = 32,
}

/// One configured parser instance, ready to be tried against an offset of
/// the input by [`ParserImpl::parse`]. Variants without a payload struct
/// carry no configuration (spec.md §4.A lists several "no parameters"
/// kinds).
#[derive(Clone)]
pub enum ParserImpl {
    Literal(text::LiteralConfig),
    DateRfc3164,
    DateRfc5424,
    Number,
    Float,
    HexNumber(numeric::HexNumberConfig),
    KernelTimestamp,
    Whitespace,
    Ipv4,
    Ipv6,
    Word,
    Alpha,
    Rest,
    OpQuotedString,
    QuotedString,
    DateIso,
    Time24hr,
    Time12hr,
    Duration,
    CiscoInterfaceSpec,
    NameValueList(text::NameValueListConfig),
    Json,
    CeeSyslog,
    Mac48,
    Cef,
    CheckpointLea,
    V2IpTables,
    StringTo(text::StringToConfig),
    CharTo(text::CharToConfig),
    CharSep(text::CharSepConfig),
    Repeat(Rc<RepeatConfig>),
    TypeRef(Rc<TypeRefConfig>),
    /// Only constructible when a [`crate::Context`] has `allow_regex` set
    /// (spec.md §4.A "no regex parser by default"); the gate lives at the
    /// compiler, not here.
    Regex(Rc<regex::bytes::Regex>),
}

impl ParserImpl {
    pub fn literal(text: impl Into<String>) -> Self {
        ParserImpl::Literal(text::LiteralConfig { text: text.into() })
    }

    /// 0-based id of this parser's kind, used both for the dispatch macro
    /// below and as half of an edge's merge identity (spec.md §4.B).
    pub fn kind_id(&self) -> u8 {
        match self {
            ParserImpl::Literal(_) => KIND_LITERAL,
            ParserImpl::DateRfc3164 => KIND_DATE_RFC3164,
            ParserImpl::DateRfc5424 => KIND_DATE_RFC5424,
            ParserImpl::Number => KIND_NUMBER,
            ParserImpl::Float => KIND_FLOAT,
            ParserImpl::HexNumber(_) => KIND_HEXNUMBER,
            ParserImpl::KernelTimestamp => KIND_KERNEL_TIMESTAMP,
            ParserImpl::Whitespace => KIND_WHITESPACE,
            ParserImpl::Ipv4 => KIND_IPV4,
            ParserImpl::Ipv6 => KIND_IPV6,
            ParserImpl::Word => KIND_WORD,
            ParserImpl::Alpha => KIND_ALPHA,
            ParserImpl::Rest => KIND_REST,
            ParserImpl::OpQuotedString => KIND_OP_QUOTED_STRING,
            ParserImpl::QuotedString => KIND_QUOTED_STRING,
            ParserImpl::DateIso => KIND_DATE_ISO,
            ParserImpl::Time24hr => KIND_TIME_24HR,
            ParserImpl::Time12hr => KIND_TIME_12HR,
            ParserImpl::Duration => KIND_DURATION,
            ParserImpl::CiscoInterfaceSpec => KIND_CISCO_INTERFACE_SPEC,
            ParserImpl::NameValueList(_) => KIND_NAME_VALUE_LIST,
            ParserImpl::Json => KIND_JSON,
            ParserImpl::CeeSyslog => KIND_CEE_SYSLOG,
            ParserImpl::Mac48 => KIND_MAC48,
            ParserImpl::Cef => KIND_CEF,
            ParserImpl::CheckpointLea => KIND_CHECKPOINT_LEA,
            ParserImpl::V2IpTables => KIND_V2_IPTABLES,
            ParserImpl::StringTo(_) => KIND_STRING_TO,
            ParserImpl::CharTo(_) => KIND_CHAR_TO,
            ParserImpl::CharSep(_) => KIND_CHAR_SEP,
            ParserImpl::Repeat(_) => KIND_REPEAT,
            ParserImpl::TypeRef(_) => KIND_TYPE_REF,
            ParserImpl::Regex(_) => KIND_REGEX,
        }
    }

    /// Identity used by [`crate::pdag::Pdag::insert_edge`] to decide whether
    /// two edges at a node are "the same edge" (spec.md §4.B): same kind,
    /// and for literals, same first byte. Field name is compared separately
    /// by the caller since it isn't a property of the parser itself.
    pub fn merge_key(&self) -> (u8, Option<u8>) {
        match self {
            ParserImpl::Literal(cfg) => (KIND_LITERAL, cfg.text.as_bytes().first().copied()),
            other => (other.kind_id(), None),
        }
    }

    pub fn parse(&self, input: &[u8], offset: usize) -> ParseOutcome {
        match self {
            ParserImpl::Literal(cfg) => text::literal(cfg, input, offset),
            ParserImpl::DateRfc3164 => datetime::date_rfc3164(input, offset),
            ParserImpl::DateRfc5424 => datetime::date_rfc5424(input, offset),
            ParserImpl::Number => numeric::number(input, offset),
            ParserImpl::Float => numeric::float(input, offset),
            ParserImpl::HexNumber(cfg) => numeric::hexnumber(cfg, input, offset),
            ParserImpl::KernelTimestamp => datetime::kernel_timestamp(input, offset),
            ParserImpl::Whitespace => text::whitespace(input, offset),
            ParserImpl::Ipv4 => network::ipv4(input, offset),
            ParserImpl::Ipv6 => network::ipv6(input, offset),
            ParserImpl::Word => text::word(input, offset),
            ParserImpl::Alpha => text::alpha(input, offset),
            ParserImpl::Rest => text::rest(input, offset),
            ParserImpl::OpQuotedString => text::op_quoted_string(input, offset),
            ParserImpl::QuotedString => text::quoted_string(input, offset),
            ParserImpl::DateIso => datetime::date_iso(input, offset),
            ParserImpl::Time24hr => datetime::time_24hr(input, offset),
            ParserImpl::Time12hr => datetime::time_12hr(input, offset),
            ParserImpl::Duration => datetime::duration(input, offset),
            ParserImpl::CiscoInterfaceSpec => network::cisco_interface_spec(input, offset),
            ParserImpl::NameValueList(cfg) => text::name_value_list(cfg, input, offset),
            ParserImpl::Json => structured::json(input, offset),
            ParserImpl::CeeSyslog => structured::cee_syslog(input, offset),
            ParserImpl::Mac48 => network::mac48(input, offset),
            ParserImpl::Cef => structured::cef(input, offset),
            ParserImpl::CheckpointLea => text::checkpoint_lea(input, offset),
            ParserImpl::V2IpTables => network::v2_iptables(input, offset),
            ParserImpl::StringTo(cfg) => text::string_to(cfg, input, offset),
            ParserImpl::CharTo(cfg) => text::char_to(cfg, input, offset),
            ParserImpl::CharSep(cfg) => text::char_sep(cfg, input, offset),
            ParserImpl::Repeat(cfg) => combinators::repeat(cfg, input, offset),
            ParserImpl::TypeRef(cfg) => combinators::type_ref(cfg, input, offset),
            ParserImpl::Regex(re) => combinators::regex_match(re, input, offset),
        }
    }
}
