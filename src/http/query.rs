//! # Query Strings
//! src/http/query.rs
//!
//! Decodificación de pares `clave=valor&clave=valor`. La misma rutina
//! procesa la query de la URL y el body de un POST.

use std::collections::BTreeMap;

/// Parámetros de un request: claves únicas, la última escritura gana
pub type Params = BTreeMap<String, String>;

/// Decodifica `%XX` y `+` (espacio)
///
/// Un fragmento que no decodifica a UTF-8 válido se deja tal cual.
///
/// # Ejemplo
/// ```
/// use webserver::http::query::url_decode;
/// assert_eq!(url_decode("hello%20world+again"), "hello world again");
/// ```
pub fn url_decode(s: &str) -> String {
    let spaced = s.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

/// Agrega los pares de `query` a `params`
///
/// - Pares sin `=` se descartan.
/// - Un valor con más `=` se reconstruye decodificando cada fragmento
///   y uniéndolos con `=`: `a=x=y` → `a: "x=y"`.
/// - Claves vacías se descartan.
pub fn merge_query_string(params: &mut Params, query: &str) {
    for pair in query.split('&') {
        let mut fragments = pair.split('=');
        let Some(raw_key) = fragments.next() else {
            continue;
        };

        let value_fragments: Vec<String> = fragments.map(url_decode).collect();
        if value_fragments.is_empty() {
            continue;
        }

        let key = url_decode(raw_key);
        if key.is_empty() {
            continue;
        }

        params.insert(key, value_fragments.join("="));
    }
}

/// Parsea una query string completa
///
/// # Ejemplo
/// ```
/// use webserver::http::query::parse_query_string;
/// let params = parse_query_string("a=1&b=2");
/// assert_eq!(params.get("a").map(String::as_str), Some("1"));
/// assert_eq!(params.get("b").map(String::as_str), Some("2"));
/// ```
pub fn parse_query_string(query: &str) -> Params {
    let mut params = Params::new();
    merge_query_string(&mut params, query);
    params
}

/// Extrae la query del texto crudo del request
///
/// Es el texto entre el primer `?` y la primera aparición de `HTTP`.
pub fn raw_query(request_text: &str) -> Option<&str> {
    let head = match request_text.find("HTTP") {
        Some(pos) => &request_text[..pos],
        None => request_text,
    };
    let start = head.find('?')? + 1;
    Some(head[start..].trim())
}
