//! Parser for `nix-support/hydra-build-products` lines.
//!
//! Each line reads `<type> <subtype> <path> [<entry point>]`:
//!
//! - `type` and `subtype` are runs of `[A-Za-z0-9_-]`
//! - `path` is either `"quoted"` (no embedded quotes, quotes stripped) or a
//!   bare token free of whitespace and quotes
//! - the optional entry point is the next whitespace-delimited token
//!
//! The whole line must match. Only ASCII whitespace (space, tab, newline,
//! carriage return, vertical tab, form feed) separates fields; any other
//! character, including Unicode spaces, is part of the token it appears in.

/// One syntactically valid product declaration. Nothing about the path has
/// been checked yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductLine<'a> {
  pub product_type: &'a str,
  pub subtype: &'a str,
  pub path: &'a str,
  pub default_path: Option<&'a str>,
}

fn is_space(c: char) -> bool {
  matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

struct Cursor<'a> {
  rest: &'a str,
}

impl<'a> Cursor<'a> {
  fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
    let end = self.rest.find(|c: char| !pred(c)).unwrap_or(self.rest.len());
    let (taken, rest) = self.rest.split_at(end);
    self.rest = rest;
    taken
  }

  fn identifier(&mut self) -> Option<&'a str> {
    let ident = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    (!ident.is_empty()).then_some(ident)
  }

  fn whitespace(&mut self) -> Option<()> {
    let ws = self.take_while(is_space);
    (!ws.is_empty()).then_some(())
  }

  fn path(&mut self) -> Option<&'a str> {
    if let Some(quoted) = self.rest.strip_prefix('"') {
      let close = quoted.find('"')?;
      if close == 0 {
        return None;
      }
      let path = &quoted[..close];
      self.rest = &quoted[close + 1..];
      Some(path)
    } else {
      let bare = self.take_while(|c| !is_space(c) && c != '"');
      (!bare.is_empty()).then_some(bare)
    }
  }

  fn token(&mut self) -> Option<&'a str> {
    let token = self.take_while(|c| !is_space(c));
    (!token.is_empty()).then_some(token)
  }
}

/// Parse one line, or `None` if it does not follow the grammar.
pub fn parse_product_line(line: &str) -> Option<ProductLine<'_>> {
  let mut cursor = Cursor { rest: line };

  let product_type = cursor.identifier()?;
  cursor.whitespace()?;
  let subtype = cursor.identifier()?;
  cursor.whitespace()?;
  let path = cursor.path()?;

  let default_path = if cursor.rest.is_empty() {
    None
  } else {
    cursor.whitespace()?;
    Some(cursor.token()?)
  };

  if !cursor.rest.is_empty() {
    return None;
  }

  Some(ProductLine {
    product_type,
    subtype,
    path,
    default_path,
  })
}
