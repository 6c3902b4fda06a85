use crate::core::config::data::Config;

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        match &self.base_url {
            Some(url) => println!("  base-url: {url}"),
            None => println!("  base-url: (unset)"),
        }
        match &self.default_model {
            Some(model) => println!("  default-model: {model}"),
            None => println!("  default-model: (unset, first listed model is used)"),
        }
        match self.idle_timeout_secs {
            Some(secs) => println!("  idle-timeout: {secs}s"),
            None => println!("  idle-timeout: off"),
        }
        match self.max_malformed_chunks {
            Some(limit) => println!("  max-malformed: {limit}"),
            None => println!("  max-malformed: off"),
        }
        if let Some(marker) = &self.stopped_marker {
            println!("  stopped-marker: {marker}");
        }
        if let Some(placeholder) = &self.error_placeholder {
            println!("  error-placeholder: {placeholder}");
        }
    }
}
