use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    EventHandler,
    EventProducer,
    Handler,
    OrderCreatedEvent,
    OrderStatusChangedEvent,
    OwnerCreatedEvent,
    OwnerDeletedEvent,
    TriggerEvent,
};

type BoxedFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_created_producer: Vec<EventProducer<OrderCreatedEvent>>,
    pub order_status_changed_producer: Vec<EventProducer<OrderStatusChangedEvent>>,
    pub owner_created_producer: Vec<EventProducer<OwnerCreatedEvent>>,
    pub owner_deleted_producer: Vec<EventProducer<OwnerDeletedEvent>>,
}

impl EventProducers {
    /// Hands the event to every subscriber of its type.
    pub async fn publish(&self, event: TriggerEvent) {
        match event {
            TriggerEvent::OrderCreated(ev) => {
                for producer in &self.order_created_producer {
                    producer.publish_event(ev.clone()).await;
                }
            },
            TriggerEvent::OrderStatusChanged(ev) => {
                for producer in &self.order_status_changed_producer {
                    producer.publish_event(ev.clone()).await;
                }
            },
            TriggerEvent::OwnerCreated(ev) => {
                for producer in &self.owner_created_producer {
                    producer.publish_event(ev.clone()).await;
                }
            },
            TriggerEvent::OwnerDeleted(ev) => {
                for producer in &self.owner_deleted_producer {
                    producer.publish_event(ev.clone()).await;
                }
            },
        }
    }
}

pub struct EventHandlers {
    pub on_order_created: Option<EventHandler<OrderCreatedEvent>>,
    pub on_order_status_changed: Option<EventHandler<OrderStatusChangedEvent>>,
    pub on_owner_created: Option<EventHandler<OwnerCreatedEvent>>,
    pub on_owner_deleted: Option<EventHandler<OwnerDeletedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_created = hooks.on_order_created.map(|f| EventHandler::new(buffer_size, f));
        let on_order_status_changed = hooks.on_order_status_changed.map(|f| EventHandler::new(buffer_size, f));
        let on_owner_created = hooks.on_owner_created.map(|f| EventHandler::new(buffer_size, f));
        let on_owner_deleted = hooks.on_owner_deleted.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_created, on_order_status_changed, on_owner_created, on_owner_deleted }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_created {
            result.order_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_status_changed {
            result.order_status_changed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_owner_created {
            result.owner_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_owner_deleted {
            result.owner_deleted_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_created {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_status_changed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_owner_created {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_owner_deleted {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_created: Option<Handler<OrderCreatedEvent>>,
    pub on_order_status_changed: Option<Handler<OrderStatusChangedEvent>>,
    pub on_owner_created: Option<Handler<OwnerCreatedEvent>>,
    pub on_owner_deleted: Option<Handler<OwnerDeletedEvent>>,
}

impl EventHooks {
    pub fn on_order_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCreatedEvent) -> BoxedFuture) + Send + Sync + 'static {
        self.on_order_created = Some(Arc::new(f));
        self
    }

    pub fn on_order_status_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderStatusChangedEvent) -> BoxedFuture) + Send + Sync + 'static {
        self.on_order_status_changed = Some(Arc::new(f));
        self
    }

    pub fn on_owner_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OwnerCreatedEvent) -> BoxedFuture) + Send + Sync + 'static {
        self.on_owner_created = Some(Arc::new(f));
        self
    }

    pub fn on_owner_deleted<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OwnerDeletedEvent) -> BoxedFuture) + Send + Sync + 'static {
        self.on_owner_deleted = Some(Arc::new(f));
        self
    }
}
