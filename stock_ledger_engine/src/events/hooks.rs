use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, LowStockEvent, StockMovedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub stock_moved_producer: Vec<EventProducer<StockMovedEvent>>,
    pub low_stock_producer: Vec<EventProducer<LowStockEvent>>,
}

impl EventProducers {
    pub async fn publish_stock_moved(&self, event: StockMovedEvent) {
        for emitter in &self.stock_moved_producer {
            emitter.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_low_stock(&self, event: LowStockEvent) {
        for emitter in &self.low_stock_producer {
            emitter.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_stock_moved: Option<EventHandler<StockMovedEvent>>,
    pub on_low_stock: Option<EventHandler<LowStockEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_stock_moved = hooks.on_stock_moved.map(|f| EventHandler::new(buffer_size, f));
        let on_low_stock = hooks.on_low_stock.map(|f| EventHandler::new(buffer_size, f));
        Self { on_stock_moved, on_low_stock }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_stock_moved {
            result.stock_moved_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_low_stock {
            result.low_stock_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_stock_moved {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_low_stock {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_stock_moved: Option<Handler<StockMovedEvent>>,
    pub on_low_stock: Option<Handler<LowStockEvent>>,
}

impl EventHooks {
    pub fn on_stock_moved<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(StockMovedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_stock_moved = Some(Arc::new(f));
        self
    }

    pub fn on_low_stock<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(LowStockEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_low_stock = Some(Arc::new(f));
        self
    }
}
