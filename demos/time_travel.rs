use std::env;
use sv_timetravel::{
    Coordinates, DateOption, DateSelect, MapConfig, MapSurface, PanoramaViewer, StreetViewLookup,
    TimeTravelController, ViewerConfig,
};

#[derive(Default)]
struct ConsoleViewer {
    pano: String,
}

impl PanoramaViewer for ConsoleViewer {
    fn configure(&mut self, config: ViewerConfig) {
        self.pano = config.pano_id.clone();
        println!(
            "[viewer] pano {} at {:.6},{:.6}, heading {:.1}°",
            config.pano_id, config.position.lat, config.position.lng, config.pov.heading
        );
    }

    fn pano(&self) -> String {
        self.pano.clone()
    }

    fn set_pano(&mut self, pano_id: &str) {
        self.pano = pano_id.to_string();
        println!("[viewer] forced to pano {pano_id}");
    }

    fn show_message(&mut self, text: &str) {
        println!("[viewer] {text}");
    }
}

struct ConsoleMap;

impl MapSurface for ConsoleMap {
    fn configure(&mut self, config: MapConfig) {
        println!(
            "[map] centered at {:.6},{:.6}, zoom {}",
            config.center.lat, config.center.lng, config.zoom
        );
    }

    fn bind_street_view(&mut self) {
        println!("[map] bound to street view");
    }
}

struct ConsoleSelect;

impl DateSelect for ConsoleSelect {
    fn replace_options(&mut self, options: &[DateOption]) {
        println!("[select] {} dates available:", options.len());
        for option in options {
            let marker = if option.selected { "*" } else { " " };
            println!("  {marker} {} ({})", option.label, option.pano_id);
        }
    }

    fn set_visible(&mut self, visible: bool) {
        println!("[select] visible: {visible}");
    }
}

/// Console-backed demo of the time-travel controller.
///
/// Runs the bootstrap flow against Google's endpoints with collaborator
/// seams that print instead of render, then reveals the date list the way a
/// real host would after the map goes idle.
///
/// Run with:
/// ```bash
/// GOOGLE_MAPS_API_KEY=your_key cargo run --example time_travel
/// ```
/// The API key is only needed for by-id lookups after panorama changes; the
/// bootstrap search works without one.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Coordinates in Montreal with plenty of historical imagery
    let coordinates = Coordinates::new(45.4580915864, -73.5754052827);

    let lookup = match env::var("GOOGLE_MAPS_API_KEY") {
        Ok(key) => StreetViewLookup::with_api_key(key),
        Err(_) => StreetViewLookup::new(),
    };

    let mut controller = TimeTravelController::new(
        lookup,
        ConsoleViewer::default(),
        ConsoleMap,
        ConsoleSelect,
        coordinates,
    );

    controller.bootstrap().await?;
    controller.handle_map_idle();

    println!(
        "\nViewing {} ({})",
        controller.selection().last_pano_id().unwrap_or("none"),
        controller
            .selection()
            .last_pano_date()
            .map(|d| d.label())
            .unwrap_or_else(|| "unknown date".to_string())
    );

    Ok(())
}
