use std::sync::Arc;

use consona_core::{
    voices::{VoiceManager, VoiceManagerConfig},
    NoOutput,
};

pub fn main() {
    env_logger::init();

    let args = std::env::args().skip(1).collect::<Vec<String>>();
    let keys = if args.is_empty() {
        vec![60, 64, 67]
    } else {
        match args.iter().map(|arg| arg.parse::<u8>()).collect::<Result<Vec<u8>, _>>() {
            Ok(keys) => keys,
            Err(err) => {
                println!("Usage: chord [midi note]... ({err})");
                return;
            }
        }
    };

    let manager = match VoiceManager::new(VoiceManagerConfig::default(), Arc::new(NoOutput)) {
        Ok(manager) => manager,
        Err(err) => {
            println!("Failed to set up the voices: {err}");
            return;
        }
    };

    for &key in &keys {
        if !manager.note_on(key, 1.0) {
            println!("Note {key} is out of range {:?}", manager.note_range());
        }
    }

    // One second at the default 60 fps, enough to get through the attack
    let mut consonances = Default::default();
    for _ in 0..60 {
        consonances = manager.tick();
    }

    let table = manager.consonance().table();
    for (key, consonance) in consonances {
        let distance = keys
            .first()
            .map(|&root| (key as i32 - root as i32).unsigned_abs() as usize);
        let fit = distance
            .and_then(|distance| table.best_fit(distance))
            .map(|rational| rational.to_string())
            .unwrap_or_default();

        let marker = if keys.contains(&key) { "*" } else { " " };
        println!("{marker} {key:3} {consonance:.6} {fit}");
    }
}
