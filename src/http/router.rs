use std::sync::Arc;

use regex::Regex;

type ParamsConverter<R> = Fn(Vec<&str>) -> Option<R> + Send + Sync;

/// Regex based route table. Routes are tried in insertion order.
pub struct RouteParser<R> {
    regex_and_converters: Vec<(Regex, Arc<ParamsConverter<R>>)>,
}

impl<R> Default for RouteParser<R> {
    fn default() -> Self {
        Self {
            regex_and_converters: Vec::new(),
        }
    }
}

impl<R> RouteParser<R> {
    /// Adds a route without path params
    pub fn add_route<F>(&mut self, regex_pattern: &str, f: F)
    where
        F: Fn() -> R + Send + Sync + 'static,
    {
        self.add_route_with_params(regex_pattern, move |_| Some(f()));
    }

    /// Adds a route whose capture groups are handed to `converter`
    pub fn add_route_with_params<F>(&mut self, regex_pattern: &str, converter: F)
    where
        F: Fn(Vec<&str>) -> Option<R> + Send + Sync + 'static,
    {
        match Regex::new(regex_pattern) {
            Ok(regex) => {
                let converter: Arc<ParamsConverter<R>> = Arc::new(converter);
                self.regex_and_converters.push((regex, converter));
            }
            Err(e) => error!("Skipping route with invalid pattern {}: {}", regex_pattern, e),
        }
    }

    /// Finds the first route matching `path`
    pub fn test(&self, path: &str) -> Option<R> {
        self.regex_and_converters
            .iter()
            .filter_map(|&(ref regex, ref converter)| {
                regex.captures(path).and_then(|captures| {
                    let params = captures
                        .iter()
                        .skip(1)
                        .filter_map(|group| group.map(|m| m.as_str()))
                        .collect::<Vec<_>>();
                    converter(params)
                })
            }).next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestRoute {
        Items,
        Item(i32),
    }

    #[test]
    fn matches_routes_with_params() {
        let mut router = RouteParser::default();
        router.add_route(r"^/items$", || TestRoute::Items);
        router.add_route_with_params(r"^/items/(\d+)$", |params| {
            params.get(0).and_then(|id| id.parse::<i32>().ok()).map(TestRoute::Item)
        });

        assert_eq!(router.test("/items"), Some(TestRoute::Items));
        assert_eq!(router.test("/items/42"), Some(TestRoute::Item(42)));
        assert_eq!(router.test("/items/x"), None);
    }
}
