//! Rulebase compiler (spec.md §4.C): parses `version=2`/`prefix=`/
//! `extendprefix=`/`rule=`/`type=`/`annotate=` directive lines and mutates
//! a [`crate::Context`]'s PDAGs and annotation set.
//!
//! Grounded in `samp.c`'s `ln_processSamp` dispatch and `pdag.c`'s
//! `addSampToTree` pattern walk, reimplemented against the arena-based
//! [`crate::pdag::Pdag`] rather than a pointer graph.

use crate::annotation::AnnotOp;
use crate::error::CompileError;
use crate::parsers::{self, ParserImpl, RepeatConfig, TypeRefConfig};
use crate::pdag::{NodeId, Pdag};
use crate::value::Value;
use std::collections::HashMap;
use std::rc::Rc;

const MAX_FIELD_NAME_LEN: usize = 128;

/// One parsed directive line, ready for [`crate::Context`] to apply.
pub enum Directive {
    Version,
    Prefix(String),
    ExtendPrefix(String),
    Rule { tags: Vec<String>, pattern: String },
    Type { name: String, pattern: String },
    Annotate { tag: String, ops: Vec<AnnotOp> },
}

/// Splits `kind=payload` and dispatches to the directive-specific parser
/// (spec.md §4.C directive table). Does not touch the context; callers
/// apply the returned [`Directive`] (kept separate so `Context::load_rulebase`
/// can decide how first-line/`version=2` enforcement interacts with the
/// rest of loading).
pub fn parse_directive(line: &str, line_no: usize) -> Result<Directive, CompileError> {
    let (kind, payload) = line
        .split_once('=')
        .ok_or_else(|| CompileError::new(line_no, "expected 'kind=payload' directive"))?;
    match kind {
        "version" => {
            if payload == "2" {
                Ok(Directive::Version)
            } else {
                Err(CompileError::new(line_no, format!("unsupported rulebase version '{}'", payload)))
            }
        }
        "prefix" => Ok(Directive::Prefix(payload.to_string())),
        "extendprefix" => Ok(Directive::ExtendPrefix(payload.to_string())),
        "rule" => parse_rule_directive(payload, line_no),
        "type" => parse_type_directive(payload, line_no),
        "annotate" => parse_annotate_directive(payload, line_no),
        other => Err(CompileError::new(line_no, format!("unknown directive kind '{}'", other))),
    }
}

fn parse_rule_directive(payload: &str, line_no: usize) -> Result<Directive, CompileError> {
    let rest = payload
        .strip_prefix('[')
        .ok_or_else(|| CompileError::new(line_no, "rule= must start with a '[tag,...]:' tag list"))?;
    let (tag_list, pattern) = rest
        .split_once("]:")
        .ok_or_else(|| CompileError::new(line_no, "rule= tag list must be terminated by ']:'"))?;
    let tags = if tag_list.is_empty() {
        Vec::new()
    } else {
        tag_list.split(',').map(|t| t.trim().to_string()).collect()
    };
    Ok(Directive::Rule { tags, pattern: pattern.to_string() })
}

fn parse_type_directive(payload: &str, line_no: usize) -> Result<Directive, CompileError> {
    let (name, pattern) = payload
        .split_once(':')
        .ok_or_else(|| CompileError::new(line_no, "type= must be '@NAME:PATTERN'"))?;
    if !name.starts_with('@') || name.len() < 2 {
        return Err(CompileError::new(line_no, "user-defined type name must start with '@'"));
    }
    if name.chars().any(|c| c.is_whitespace()) {
        return Err(CompileError::new(line_no, "type name may not contain whitespace"));
    }
    Ok(Directive::Type { name: name.to_string(), pattern: pattern.to_string() })
}

fn parse_annotate_directive(payload: &str, line_no: usize) -> Result<Directive, CompileError> {
    let (tag, ops_text) = payload
        .split_once(':')
        .ok_or_else(|| CompileError::new(line_no, "annotate= must be 'TAG:OPS'"))?;
    if tag.is_empty() {
        return Err(CompileError::new(line_no, "annotate= tag must not be empty"));
    }
    let ops = parse_annotation_ops(ops_text, line_no)?;
    Ok(Directive::Annotate { tag: tag.to_string(), ops })
}

/// Parses a whitespace-separated list of `+name="value"` (ADD) / `-name`
/// (REMOVE) operations (spec.md §4.C "Annotation directive grammar").
fn parse_annotation_ops(text: &str, line_no: usize) -> Result<Vec<AnnotOp>, CompileError> {
    let mut ops = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }
        match bytes[i] {
            b'+' => {
                i += 1;
                let name_start = i;
                while i < bytes.len() && bytes[i] != b'=' {
                    i += 1;
                }
                let name = text[name_start..i].to_string();
                if bytes.get(i) != Some(&b'=') || bytes.get(i + 1) != Some(&b'"') {
                    return Err(CompileError::new(line_no, "expected '+name=\"value\"'"));
                }
                i += 2;
                let value_start = i;
                while i < bytes.len() && bytes[i] != b'"' {
                    i += 1;
                }
                if i >= bytes.len() {
                    return Err(CompileError::new(line_no, "unterminated annotation value"));
                }
                let value = text[value_start..i].to_string();
                i += 1;
                ops.push(AnnotOp::Add { name, value });
            }
            b'-' => {
                i += 1;
                let name_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                ops.push(AnnotOp::Remove { name: text[name_start..i].to_string() });
            }
            _ => return Err(CompileError::new(line_no, "expected '+' or '-' operation")),
        }
    }
    Ok(ops)
}

/// The field-reference grammar item produced while scanning a pattern
/// (spec.md §4.C "Pattern grammar").
enum Item<'p> {
    Literal(&'p str),
    Field { name: Option<String>, type_str: String, extra: Option<String>, overrides: Option<Value> },
}

/// Compiles `pattern` into `dag` starting at `from`, returning the node the
/// pattern ends on (not yet marked terminal — the caller does that with
/// whatever tags apply). `type_dags` resolves `%field:@typename%`
/// references; `allow_regex` gates the `regex` parser kind (spec.md §4.A
/// "no regex parser by default").
pub fn compile_pattern(
    dag: &mut Pdag,
    from: NodeId,
    pattern: &str,
    type_dags: &HashMap<String, Rc<Pdag>>,
    allow_regex: bool,
    line_no: usize,
) -> Result<NodeId, CompileError> {
    let mut node = from;
    for item in scan_pattern(pattern, line_no)? {
        match item {
            Item::Literal(text) => {
                if text.is_empty() {
                    continue;
                }
                // spec.md §4.C step 1: one literal edge per byte; the
                // optimizer compacts these after load.
                for byte in text.bytes() {
                    node = dag.insert_edge(node, ParserImpl::literal((byte as char).to_string()), None);
                }
            }
            Item::Field { name, type_str, extra, overrides } => {
                if let Some(n) = &name {
                    if n.len() > MAX_FIELD_NAME_LEN {
                        return Err(CompileError::new(line_no, format!("field name '{}' exceeds {} bytes", n, MAX_FIELD_NAME_LEN)));
                    }
                }
                let parser = build_parser(&type_str, extra.as_deref(), overrides.as_ref(), type_dags, allow_regex, line_no)?;
                let field_name = name.filter(|n| n != "-");
                node = dag.insert_edge(node, parser, field_name);
            }
        }
    }
    Ok(node)
}

/// Splits `pattern` into literal runs and field references (spec.md §4.C
/// "Pattern grammar"): `%%` is a literal `%`; a field reference is
/// everything between an opening `%` and the matching closing `%`, with
/// brace depth tracked so an embedded `{...}` JSON block's own `%`-free
/// content doesn't end the reference early.
fn scan_pattern<'p>(pattern: &'p str, line_no: usize) -> Result<Vec<Item<'p>>, CompileError> {
    let bytes = pattern.as_bytes();
    let mut items = Vec::new();
    let mut i = 0;
    let mut literal_start = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        if bytes.get(i + 1) == Some(&b'%') {
            // literal '%': flush what came before, push '%', skip past it.
            if i > literal_start {
                items.push(Item::Literal(&pattern[literal_start..i]));
            }
            items.push(Item::Literal("%"));
            i += 2;
            literal_start = i;
            continue;
        }
        if i > literal_start {
            items.push(Item::Literal(&pattern[literal_start..i]));
        }
        let content_start = i + 1;
        let mut j = content_start;
        let mut depth = 0i32;
        let mut in_string = false;
        loop {
            match bytes.get(j) {
                None => return Err(CompileError::new(line_no, "unterminated field reference")),
                Some(b'"') => {
                    in_string = !in_string;
                    j += 1;
                }
                Some(b'{') if !in_string => {
                    depth += 1;
                    j += 1;
                }
                Some(b'}') if !in_string => {
                    depth -= 1;
                    j += 1;
                }
                Some(b'%') if depth == 0 && !in_string => break,
                _ => j += 1,
            }
        }
        let content = &pattern[content_start..j];
        items.push(parse_field_ref(content, line_no)?);
        i = j + 1;
        literal_start = i;
    }
    if literal_start < bytes.len() {
        items.push(Item::Literal(&pattern[literal_start..]));
    }
    Ok(items)
}

fn parse_field_ref(content: &str, line_no: usize) -> Result<Item<'_>, CompileError> {
    if content.starts_with('{') {
        let (_, value) = crate::json_scan::scan(content.as_bytes(), 0)
            .ok_or_else(|| CompileError::new(line_no, "invalid JSON field reference"))?;
        let Value::Object(fields) = value else {
            return Err(CompileError::new(line_no, "JSON field reference must be an object"));
        };
        let name = fields.get("name").and_then(Value::as_str).map(|s| s.to_string());
        let type_str = fields
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| CompileError::new(line_no, "JSON field reference missing 'type'"))?
            .to_string();
        let overrides = Value::Object(fields);
        return Ok(Item::Field { name, type_str, extra: None, overrides: Some(overrides) });
    }

    // Legacy form: NAME:TYPE[:EXTRA][{json overrides}]
    let (head, overrides) = match content.find('{') {
        Some(brace_at) => {
            let (_, json) = crate::json_scan::scan(content[brace_at..].as_bytes(), 0)
                .ok_or_else(|| CompileError::new(line_no, "invalid embedded JSON block"))?;
            (&content[..brace_at], Some(json))
        }
        None => (content, None),
    };
    let mut parts = head.splitn(3, ':');
    let name = parts.next().filter(|s| !s.is_empty());
    let type_str = parts
        .next()
        .ok_or_else(|| CompileError::new(line_no, "field reference missing ':type'"))?
        .to_string();
    let extra = parts.next().map(|s| s.to_string());
    Ok(Item::Field { name: name.map(|s| s.to_string()), type_str, extra, overrides })
}

fn build_parser(
    type_str: &str,
    extra: Option<&str>,
    overrides: Option<&Value>,
    type_dags: &HashMap<String, Rc<Pdag>>,
    allow_regex: bool,
    line_no: usize,
) -> Result<ParserImpl, CompileError> {
    let override_str = |key: &str| -> Option<String> {
        match overrides {
            Some(Value::Object(f)) => f.get(key).and_then(Value::as_str).map(|s| s.to_string()),
            _ => None,
        }
    };
    let override_int = |key: &str| -> Option<u64> {
        match overrides {
            Some(Value::Object(f)) => match f.get(key) {
                Some(Value::Int(n)) => Some(*n as u64),
                _ => None,
            },
            _ => None,
        }
    };

    if let Some(type_name) = type_str.strip_prefix('@') {
        let key = format!("@{}", type_name);
        let sub_dag = type_dags
            .get(&key)
            .ok_or_else(|| CompileError::new(line_no, format!("undefined type '{}'", key)))?
            .clone();
        return Ok(ParserImpl::TypeRef(Rc::new(TypeRefConfig { dag: sub_dag })));
    }

    Ok(match type_str {
        "literal" => {
            let text = extra.map(|s| s.to_string()).or_else(|| override_str("text")).unwrap_or_default();
            ParserImpl::literal(text)
        }
        "date-rfc3164" => ParserImpl::DateRfc3164,
        "date-rfc5424" => ParserImpl::DateRfc5424,
        "number" => ParserImpl::Number,
        "float" => ParserImpl::Float,
        "hexnumber" => {
            let maxval = extra
                .and_then(|s| s.parse::<u64>().ok())
                .or_else(|| override_int("maxval"));
            ParserImpl::HexNumber(parsers::numeric::HexNumberConfig { maxval })
        }
        "kernel-timestamp" => ParserImpl::KernelTimestamp,
        "whitespace" => ParserImpl::Whitespace,
        "ipv4" => ParserImpl::Ipv4,
        "ipv6" => ParserImpl::Ipv6,
        "word" => ParserImpl::Word,
        "alpha" => ParserImpl::Alpha,
        "rest" => ParserImpl::Rest,
        "op-quoted-string" => ParserImpl::OpQuotedString,
        "quoted-string" => ParserImpl::QuotedString,
        "date-iso" => ParserImpl::DateIso,
        "time-24hr" => ParserImpl::Time24hr,
        "time-12hr" => ParserImpl::Time12hr,
        "duration" => ParserImpl::Duration,
        "cisco-interface-spec" => ParserImpl::CiscoInterfaceSpec,
        "name-value-list" => {
            // Pair separation is always whitespace (spec.md §4.A), not a
            // configurable byte; only the name/value separator is tunable.
            let kv_sep = extra
                .and_then(|s| s.bytes().next())
                .or_else(|| override_str("kv-sep").and_then(|s| s.bytes().next()))
                .unwrap_or(b'=');
            ParserImpl::NameValueList(parsers::text::NameValueListConfig { kv_sep })
        }
        "json" => ParserImpl::Json,
        "cee-syslog" => ParserImpl::CeeSyslog,
        "mac48" => ParserImpl::Mac48,
        "cef" => ParserImpl::Cef,
        "checkpoint-lea" => ParserImpl::CheckpointLea,
        "v2-iptables" => ParserImpl::V2IpTables,
        "string-to" => {
            let needle = extra.map(|s| s.to_string()).or_else(|| override_str("separator"))
                .ok_or_else(|| CompileError::new(line_no, "string-to requires a separator"))?;
            ParserImpl::StringTo(parsers::text::StringToConfig { needle })
        }
        "char-to" => {
            let charset = extra.map(|s| s.to_string()).or_else(|| override_str("charset"))
                .ok_or_else(|| CompileError::new(line_no, "char-to requires a charset"))?;
            ParserImpl::CharTo(parsers::text::CharToConfig { terminators: charset.into_bytes() })
        }
        "char-sep" => {
            let charset = extra.map(|s| s.to_string()).or_else(|| override_str("charset"))
                .ok_or_else(|| CompileError::new(line_no, "char-sep requires a separator char"))?;
            let separator = *charset.as_bytes().first()
                .ok_or_else(|| CompileError::new(line_no, "char-sep separator must not be empty"))?;
            ParserImpl::CharSep(parsers::text::CharSepConfig { separator })
        }
        "repeat" => {
            let parser_pattern = override_str("parser")
                .ok_or_else(|| CompileError::new(line_no, "repeat requires a 'parser' pattern"))?;
            let while_pattern = override_str("while");
            let element = Rc::new(compile_sub_pattern(&parser_pattern, type_dags, allow_regex, line_no)?);
            let while_cond = match while_pattern {
                Some(p) => Some(Rc::new(compile_sub_pattern(&p, type_dags, allow_regex, line_no)?)),
                None => None,
            };
            ParserImpl::Repeat(Rc::new(RepeatConfig { element, while_cond }))
        }
        "regex" => {
            if !allow_regex {
                return Err(CompileError::new(line_no, "regex parser kind requires allow_regex option"));
            }
            let pattern = extra.map(|s| s.to_string()).or_else(|| override_str("pattern"))
                .ok_or_else(|| CompileError::new(line_no, "regex requires a 'pattern'"))?;
            let re = regex::bytes::Regex::new(&format!("^(?:{})", pattern))
                .map_err(|e| CompileError::new(line_no, format!("invalid regex: {}", e)))?;
            ParserImpl::Regex(Rc::new(re))
        }
        other => return Err(CompileError::new(line_no, format!("unknown parser kind '{}'", other))),
    })
}

fn compile_sub_pattern(
    pattern: &str,
    type_dags: &HashMap<String, Rc<Pdag>>,
    allow_regex: bool,
    line_no: usize,
) -> Result<Pdag, CompileError> {
    let mut sub = Pdag::new();
    let root = sub.root();
    let end = compile_pattern(&mut sub, root, pattern, type_dags, allow_regex, line_no)?;
    sub.mark_terminal(end, Vec::new());
    Ok(sub)
}
